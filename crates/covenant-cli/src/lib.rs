//! Command implementations behind the `covenant` binary.
//!
//! Each command writes its result to a caller-supplied writer so it can be
//! driven from tests without spawning a process.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};

use covenant::config::{ConfigLoader, CovenantConfig, DEFAULT_ENV_PREFIX};
use covenant::verifier::{BodyMatchers, ContractVerifier, TestFramework, VerifierConfig};
use covenant::xeger::Xeger;

/// Expression used for the response text in generated test bodies.
pub const DEFAULT_RESPONSE_EXPRESSION: &str = "response.getBody().asString()";

/// Covenant - contract testing helpers
#[derive(Debug, Parser)]
#[command(name = "covenant")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true, env = "COVENANT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate sample strings matching a regular expression
    Xeger {
        /// Regular expression to sample from
        regex: String,

        /// Number of strings to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum characters per string
        #[arg(long)]
        iteration_limit: Option<usize>,
    },

    /// Print the assertion source checking a JSON response body
    Assertions {
        /// File holding the expected JSON body
        file: PathBuf,

        /// JSON file with body matchers
        #[arg(short, long)]
        matchers: Option<PathBuf>,

        /// Check array sizes and element order
        #[arg(long)]
        ordered: bool,

        /// Emit Groovy instead of Java
        #[arg(long)]
        groovy: bool,

        /// Emit an emptiness check for empty bodies
        #[arg(long)]
        include_empty_check: bool,

        /// Expression yielding the response text in the generated test
        #[arg(long, default_value = DEFAULT_RESPONSE_EXPRESSION)]
        response: String,
    },

    /// Check an actual JSON body against an expected one
    Verify {
        /// File holding the expected JSON body
        expected: PathBuf,

        /// File holding the actual JSON body
        actual: PathBuf,

        /// JSON file with body matchers
        #[arg(short, long)]
        matchers: Option<PathBuf>,

        /// Check array sizes and element order
        #[arg(long)]
        ordered: bool,
    },
}

/// Loads configuration: defaults, then the file if given, then
/// `COVENANT__*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<CovenantConfig> {
    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = path {
        loader = loader
            .with_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
    }
    Ok(loader.with_env_prefix(DEFAULT_ENV_PREFIX).load()?)
}

/// Runs one command against an already loaded configuration.
pub fn run<W: Write>(command: Commands, config: &CovenantConfig, out: &mut W) -> Result<()> {
    match command {
        Commands::Xeger {
            regex,
            count,
            seed,
            iteration_limit,
        } => {
            let limit = iteration_limit.unwrap_or(config.generator.iteration_limit);
            let mut xeger = match seed.or(config.generator.seed) {
                Some(seed) => Xeger::seeded(&regex, seed),
                None => Xeger::from_entropy(&regex),
            }
            .with_context(|| format!("compiling {regex:?}"))?
            .with_iteration_limit(limit);
            debug!(regex = %regex, count, limit, "generating samples");
            for _ in 0..count {
                writeln!(out, "{}", xeger.generate())?;
            }
        }
        Commands::Assertions {
            file,
            matchers,
            ordered,
            groovy,
            include_empty_check,
            response,
        } => {
            let mut verifier_config = config.verifier.clone();
            verifier_config.assert_json_size |= ordered;
            verifier_config.include_empty_check |= include_empty_check;
            if groovy {
                verifier_config = verifier_config.with_framework(TestFramework::Groovy);
            }
            let body = read_json(&file)?;
            let matchers = read_matchers(matchers.as_deref())?;
            let text = ContractVerifier::new(verifier_config)
                .generate_test_body(&body, &matchers, &response)?;
            out.write_all(text.as_bytes())?;
        }
        Commands::Verify {
            expected,
            actual,
            matchers,
            ordered,
        } => {
            let verifier_config = VerifierConfig {
                assert_json_size: config.verifier.assert_json_size || ordered,
                ..config.verifier.clone()
            };
            let expected_body = read_json(&expected)?;
            let actual_body = read_json(&actual)?;
            let matchers = read_matchers(matchers.as_deref())?;
            ContractVerifier::new(verifier_config)
                .verify_body_with_matchers(&expected_body, &actual_body, &matchers)
                .with_context(|| {
                    format!("{} does not satisfy {}", actual.display(), expected.display())
                })?;
            info!(
                expected = %expected.display(),
                actual = %actual.display(),
                "body verified"
            );
            writeln!(out, "OK")?;
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_matchers(path: Option<&Path>) -> Result<BodyMatchers> {
    match path {
        Some(path) => Ok(serde_json::from_value(read_json(path)?)?),
        None => Ok(BodyMatchers::new()),
    }
}
