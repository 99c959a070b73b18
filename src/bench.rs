//! Benchmark driver: sequential versus parallel on random operands.
//!
//! [`run`] generates `A (rows x cols)` and `B (cols x rows)` with entries
//! uniform in `[0, 1)`, times both multipliers over `eval_runs` repetitions,
//! checks that their results are identical and reports the averages.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::distr::StandardUniform;
use rand::prelude::*;

use crate::{
    error::{invalid_config, Result},
    matrix::{Element, Matrix},
    parallel::{ParallelConfig, ParallelMultiplier, Strategy},
    sequential::seq_matmul,
    verify::ensure_equal,
};

/// Inputs to one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    /// Rows of A and columns of B.
    pub rows: usize,
    /// Columns of A and rows of B.
    pub cols: usize,
    /// Timed repetitions per multiplier; the reported times are their average.
    pub eval_runs: usize,
    pub parallel: ParallelConfig,
    /// Seed for operand generation. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            rows: 200,
            cols: 200,
            eval_runs: 1,
            parallel: ParallelConfig::default(),
            seed: None,
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(invalid_config(format!(
                "rows and cols must be at least 1 (got {}x{})",
                self.rows, self.cols
            )));
        }
        // The driver builds rows x cols, cols x rows and a rows x rows product.
        if self.rows.checked_mul(self.cols).is_none() || self.rows.checked_mul(self.rows).is_none() {
            return Err(invalid_config(format!(
                "{}x{} operands are too large to allocate",
                self.rows, self.cols
            )));
        }
        if self.eval_runs == 0 {
            return Err(invalid_config("eval_runs must be at least 1"));
        }
        if self.parallel.workers == 0 {
            return Err(invalid_config("workers must be at least 1"));
        }
        Ok(())
    }
}

/// Averaged timings of one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub rows: usize,
    pub cols: usize,
    pub eval_runs: usize,
    pub workers: usize,
    /// Path the parallel multiplier took for this workload.
    pub strategy: Strategy,
    pub sequential: Duration,
    pub parallel: Duration,
}

impl BenchmarkReport {
    /// Average sequential time over average parallel time.
    ///
    /// Returns 0.0 when the parallel time is zero.
    pub fn speedup(&self) -> f64 {
        if self.parallel.is_zero() {
            return 0.0;
        }
        self.sequential.as_secs_f64() / self.parallel.as_secs_f64()
    }

    /// Speedup per worker, in percent.
    pub fn efficiency(&self) -> f64 {
        100.0 * self.speedup() / self.workers as f64
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Average Sequential Time: {:.2} ms",
            self.sequential.as_secs_f64() * 1000.0
        )?;
        writeln!(
            f,
            "Average Parallel Time: {:.2} ms",
            self.parallel.as_secs_f64() * 1000.0
        )?;
        writeln!(f, "Speedup: {:.2}", self.speedup())?;
        write!(f, "Efficiency: {:.2}%", self.efficiency())
    }
}

/// A `rows x cols` matrix with entries drawn uniformly from `[0, 1)`.
pub fn random_matrix<T, R>(rows: usize, cols: usize, rng: &mut R) -> Result<Matrix<T>>
where
    T: Element,
    R: Rng + ?Sized,
    StandardUniform: Distribution<T>,
{
    Matrix::from_fn(rows, cols, |_, _| rng.random::<T>())
}

/// Runs the full benchmark described by `config`.
///
/// # Errors
///
/// Fails on an invalid configuration, on any multiplier error, and with
/// [`MatmulError::ResultMismatch`](crate::MatmulError::ResultMismatch) if the
/// two results are not identical.
pub fn run(config: &BenchmarkConfig) -> Result<BenchmarkReport> {
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let a: Matrix<f64> = random_matrix(config.rows, config.cols, &mut rng)?;
    let b: Matrix<f64> = random_matrix(config.cols, config.rows, &mut rng)?;
    info!(
        "multiplying {}x{} by {}x{} ({} runs, {} workers, threshold {})",
        config.rows,
        config.cols,
        config.cols,
        config.rows,
        config.eval_runs,
        config.parallel.workers,
        config.parallel.threshold
    );

    let multiplier = ParallelMultiplier::new(config.parallel);

    let sequential_result = seq_matmul(&a, &b)?;
    let sequential = average_time(config.eval_runs, || seq_matmul(&a, &b).map(drop))?;
    debug!("sequential average: {sequential:?}");

    let (parallel_result, dispatch) = multiplier.multiply_with_report(&a, &b)?;
    let parallel = average_time(config.eval_runs, || multiplier.multiply(&a, &b).map(drop))?;
    debug!(
        "parallel average: {parallel:?} ({:?}, {} tasks)",
        dispatch.strategy, dispatch.tasks_spawned
    );

    ensure_equal(&sequential_result, &parallel_result)?;

    Ok(BenchmarkReport {
        rows: config.rows,
        cols: config.cols,
        eval_runs: config.eval_runs,
        workers: config.parallel.workers,
        strategy: dispatch.strategy,
        sequential,
        parallel,
    })
}

fn average_time<F>(runs: usize, mut f: F) -> Result<Duration>
where
    F: FnMut() -> Result<()>,
{
    let mut total = Duration::ZERO;
    for _ in 0..runs {
        let start = Instant::now();
        f()?;
        total += start.elapsed();
    }
    Ok(Duration::from_secs_f64(total.as_secs_f64() / runs as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatmulError;

    fn small_config() -> BenchmarkConfig {
        BenchmarkConfig {
            rows: 12,
            cols: 7,
            eval_runs: 2,
            parallel: ParallelConfig {
                workers: 3,
                threshold: 0,
            },
            seed: Some(7),
        }
    }

    #[test]
    fn test_run_small_parallel() {
        let report = run(&small_config()).unwrap();
        assert_eq!(report.strategy, Strategy::Parallel);
        assert_eq!((report.rows, report.cols), (12, 7));
        assert_eq!(report.workers, 3);
    }

    #[test]
    fn test_run_below_threshold() {
        let config = BenchmarkConfig {
            parallel: ParallelConfig {
                workers: 2,
                threshold: 25_000,
            },
            ..small_config()
        };
        assert_eq!(run(&config).unwrap().strategy, Strategy::Sequential);
    }

    #[test]
    fn test_invalid_configs() {
        let zero_runs = BenchmarkConfig {
            eval_runs: 0,
            ..small_config()
        };
        assert!(matches!(
            run(&zero_runs),
            Err(MatmulError::InvalidConfig { .. })
        ));

        let zero_rows = BenchmarkConfig {
            rows: 0,
            ..small_config()
        };
        assert!(zero_rows.validate().is_err());

        let huge = BenchmarkConfig {
            rows: 4_294_967_296,
            cols: 4_294_967_297,
            ..small_config()
        };
        assert!(matches!(
            run(&huge),
            Err(MatmulError::InvalidConfig { .. })
        ));

        let mut zero_workers = small_config();
        zero_workers.parallel.workers = 0;
        assert!(zero_workers.validate().is_err());
    }

    #[test]
    fn test_random_matrix_range_and_seed() {
        let mut rng = StdRng::seed_from_u64(42);
        let m: Matrix<f64> = random_matrix(20, 30, &mut rng).unwrap();
        assert!(m.as_slice().iter().all(|v| (0.0..1.0).contains(v)));

        let mut rng = StdRng::seed_from_u64(42);
        let again: Matrix<f64> = random_matrix(20, 30, &mut rng).unwrap();
        assert_eq!(m, again);
    }

    #[test]
    fn test_report_metrics_and_display() {
        let report = BenchmarkReport {
            rows: 200,
            cols: 200,
            eval_runs: 1,
            workers: 4,
            strategy: Strategy::Parallel,
            sequential: Duration::from_millis(80),
            parallel: Duration::from_millis(25),
        };
        assert!((report.speedup() - 3.2).abs() < 1e-9);
        assert!((report.efficiency() - 80.0).abs() < 1e-9);

        let unmeasured = BenchmarkReport {
            parallel: Duration::ZERO,
            ..report.clone()
        };
        assert_eq!(unmeasured.speedup(), 0.0);
        assert_eq!(unmeasured.efficiency(), 0.0);
        assert!(unmeasured.to_string().contains("Speedup: 0.00"));

        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Average Sequential Time: 80.00 ms",
                "Average Parallel Time: 25.00 ms",
                "Speedup: 3.20",
                "Efficiency: 80.00%",
            ]
        );
    }
}
