//! CLI command definitions and argument parsing

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pwdm_crypto::envelope::{self, envelope_len, split_envelope, EnvelopeError, RecipientPublicKey, BLOCK_LEN, HEADER_LEN};
use pwdm_crypto::guardian::{GuardianError, KeyPairGuardian};
use pwdm_crypto::rsa::{self, RsaError};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::{Config, ConfigError};
use crate::keys::{self, KeyFileError};
use crate::output::{
    EnvelopeOutput, InspectOutput, KeyCheckOutput, KeygenOutput, OutputFormat, OutputFormatter,
    PathOutput, Report, ValueOutput, VerifyOutput,
};
use crate::ExitCode;

/// pwdm - password envelopes and RSA key pairs for the password manager client
#[derive(Parser, Debug)]
#[command(name = "pwdm")]
#[command(version, about = "Password envelopes and RSA key pairs for the pwdm client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet (overrides config)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// A command that did not complete. Carries the exit status to end with.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommandFailure {
    pub code: ExitCode,
    pub message: String,
}

impl CommandFailure {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::InvalidInput,
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::GeneralError,
            message: message.into(),
        }
    }
}

impl From<RsaError> for CommandFailure {
    fn from(e: RsaError) -> Self {
        let code = match e {
            RsaError::InvalidEncoding(_) => ExitCode::InvalidInput,
            ref other => ExitCode::from(other.kind()),
        };
        Self {
            code,
            message: e.to_string(),
        }
    }
}

impl From<EnvelopeError> for CommandFailure {
    fn from(e: EnvelopeError) -> Self {
        let code = match e {
            EnvelopeError::CryptoFailure(_) => ExitCode::GeneralError,
            _ => ExitCode::InvalidInput,
        };
        Self {
            code,
            message: e.to_string(),
        }
    }
}

impl From<GuardianError> for CommandFailure {
    fn from(e: GuardianError) -> Self {
        Self {
            code: ExitCode::from(e.kind()),
            message: e.to_string(),
        }
    }
}

impl From<KeyFileError> for CommandFailure {
    fn from(e: KeyFileError) -> Self {
        match e {
            KeyFileError::Write { .. } => Self::general(e.to_string()),
            _ => Self::invalid(e.to_string()),
        }
    }
}

impl From<ConfigError> for CommandFailure {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationError(_) => Self::invalid(e.to_string()),
            _ => Self::general(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CommandFailure {
    fn from(e: std::io::Error) -> Self {
        Self::general(e.to_string())
    }
}

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub formatter: OutputFormatter,
}

impl Context {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        let format = config.output.format.parse().unwrap_or_default();
        let formatter = OutputFormatter::new(format, config.output.verbose);
        Self {
            config,
            config_path,
            formatter,
        }
    }

    /// Print the report or the failure and pick the exit code.
    fn finish<R: Report>(&self, command: &str, result: Result<R, CommandFailure>) -> ExitCode {
        match result {
            Ok(report) => {
                self.formatter.print_report(&report, command);
                report.exit_code()
            }
            Err(failure) => {
                debug!(command, code = failure.code.name(), "command failed");
                self.formatter.error(&failure.message, failure.code);
                failure.code
            }
        }
    }

    fn public_key_path(&self, flag: Option<PathBuf>) -> Result<PathBuf, CommandFailure> {
        flag.or_else(|| self.config.keys.public_key_path.clone())
            .ok_or_else(|| {
                CommandFailure::invalid("no public key given (use --public-key or keys.public_key_path)")
            })
    }

    fn private_key_path(&self, flag: Option<PathBuf>) -> Result<PathBuf, CommandFailure> {
        flag.or_else(|| self.config.keys.private_key_path.clone())
            .ok_or_else(|| {
                CommandFailure::invalid(
                    "no private key given (use --private-key or keys.private_key_path)",
                )
            })
    }
}

impl Cli {
    /// Execute the command with a pre-loaded configuration.
    pub fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let ctx = Context::new(config, self.config);
        let code = match self.command {
            Commands::Encrypt(args) => ctx.finish("encrypt", args.run(&ctx)),
            Commands::Inspect(args) => ctx.finish("inspect", args.run()),
            Commands::Keygen(args) => ctx.finish("keygen", args.run(&ctx)),
            Commands::CheckKey(args) => ctx.finish("check-key", args.run(&ctx)),
            Commands::Sign(args) => ctx.finish("sign", args.run(&ctx)),
            Commands::Verify(args) => ctx.finish("verify", args.run(&ctx)),
            Commands::Seal(args) => ctx.finish("seal", args.run(&ctx)),
            Commands::Open(args) => ctx.finish("open", args.run(&ctx)),
            Commands::Config(args) => args.execute(&ctx)?,
        };
        Ok(code)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seal a password into a server envelope
    Encrypt(EncryptArgs),
    /// Show the segments of an envelope
    Inspect(InspectArgs),
    /// Generate an RSA key pair
    Keygen(KeygenArgs),
    /// Check that a private key pairs with a public key
    CheckKey(CheckKeyArgs),
    /// Sign data with SHA512withRSA
    Sign(SignArgs),
    /// Verify a SHA512withRSA signature
    Verify(VerifyArgs),
    /// RSA-OAEP encrypt text to a public key
    Seal(SealArgs),
    /// RSA-OAEP decrypt with a private key
    Open(OpenArgs),
    /// Show or initialize the configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct EncryptArgs {
    /// Text to seal (read from stdin if omitted)
    #[arg(long)]
    pub text: Option<String>,

    /// Recipient P-256 key: base64 SPKI, PEM, or a file holding either
    /// (defaults to server.ecc_public_key)
    #[arg(long)]
    pub recipient: Option<String>,
}

impl EncryptArgs {
    fn run(self, ctx: &Context) -> Result<EnvelopeOutput, CommandFailure> {
        let recipient = match self.recipient {
            Some(given) => resolve_recipient(&given)?,
            None => ctx.config.server.recipient()?,
        };
        let plaintext = match self.text {
            Some(text) => Zeroizing::new(text),
            None => {
                ctx.formatter.progress("Reading plaintext from stdin...");
                read_stdin_line()?
            }
        };

        let sealed = envelope::encrypt(&plaintext, &recipient)?;
        Ok(EnvelopeOutput {
            envelope: sealed,
            plaintext_bytes: plaintext.len(),
            envelope_bytes: envelope_len(plaintext.len()),
        })
    }
}

fn resolve_recipient(given: &str) -> Result<RecipientPublicKey, CommandFailure> {
    let path = Path::new(given);
    if path.is_file() {
        let text = keys::read_pem(path)?;
        return Ok(RecipientPublicKey::parse(&text)?);
    }
    Ok(RecipientPublicKey::parse(given)?)
}

/// Read all of stdin, dropping one trailing line ending.
fn read_stdin_line() -> Result<Zeroizing<String>, CommandFailure> {
    let mut input = Zeroizing::new(String::new());
    std::io::stdin().read_to_string(&mut input)?;
    let trimmed_len = input
        .strip_suffix("\r\n")
        .or_else(|| input.strip_suffix('\n'))
        .map(str::len)
        .unwrap_or(input.len());
    input.truncate(trimmed_len);
    Ok(input)
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Base64 envelope
    pub envelope: String,
}

impl InspectArgs {
    fn run(self) -> Result<InspectOutput, CommandFailure> {
        let parts = split_envelope(&self.envelope)?;
        let on_curve = RecipientPublicKey::from_container_bytes(&parts.ephemeral_point).is_ok();

        Ok(InspectOutput {
            total_bytes: HEADER_LEN + parts.ciphertext.len(),
            point_tag: format!("{:#04x}", parts.ephemeral_point[0]),
            point_on_curve: on_curve,
            ephemeral_point: hex::encode(parts.ephemeral_point),
            iv: hex::encode(parts.iv),
            ciphertext_bytes: parts.ciphertext.len(),
            ciphertext_blocks: parts.ciphertext.len() / BLOCK_LEN,
            max_plaintext_bytes: parts.ciphertext.len() - 1,
        })
    }
}

#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Directory for private.pem and public.pem
    #[arg(long)]
    pub out_dir: PathBuf,

    /// Modulus size (defaults to keys.default_bits)
    #[arg(long)]
    pub bits: Option<usize>,

    /// Overwrite existing key files
    #[arg(long)]
    pub force: bool,
}

impl KeygenArgs {
    fn run(self, ctx: &Context) -> Result<KeygenOutput, CommandFailure> {
        let bits = self.bits.unwrap_or(ctx.config.keys.default_bits);
        ctx.formatter
            .progress(&format!("Generating {bits}-bit RSA key pair..."));
        let pair = rsa::generate_key_pair(bits)?;
        let written = keys::write_key_pair(&self.out_dir, &pair, self.force)?;
        ctx.formatter.success("Key pair written");

        Ok(KeygenOutput {
            bits,
            private_key_path: written.private_path.display().to_string(),
            public_key_path: written.public_path.display().to_string(),
        })
    }
}

#[derive(Parser, Debug)]
pub struct CheckKeyArgs {
    /// Public key PEM file (defaults to keys.public_key_path)
    #[arg(long)]
    pub public_key: Option<PathBuf>,

    /// Private key PEM file (defaults to keys.private_key_path)
    #[arg(long)]
    pub private_key: Option<PathBuf>,
}

impl CheckKeyArgs {
    fn run(self, ctx: &Context) -> Result<KeyCheckOutput, CommandFailure> {
        let public_pem = keys::read_pem(&ctx.public_key_path(self.public_key)?)?;
        let private_pem = keys::read_pem(&ctx.private_key_path(self.private_key)?)?;

        let mut guardian = KeyPairGuardian::with_public_key(public_pem.as_str());
        let outcome = guardian.check(&private_pem);
        Ok(KeyCheckOutput {
            matched: outcome.success,
            message: outcome.message,
            kind: outcome.kind,
        })
    }
}

#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Private key PEM file (defaults to keys.private_key_path)
    #[arg(long)]
    pub private_key: Option<PathBuf>,

    /// Data to sign, usually the account uid
    #[arg(long)]
    pub data: String,
}

impl SignArgs {
    fn run(self, ctx: &Context) -> Result<ValueOutput, CommandFailure> {
        let private_pem = keys::read_pem(&ctx.private_key_path(self.private_key)?)?;
        Ok(ValueOutput {
            label: "Signature",
            value: rsa::sign(&self.data, &private_pem)?,
        })
    }
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Public key PEM file (defaults to keys.public_key_path)
    #[arg(long)]
    pub public_key: Option<PathBuf>,

    #[arg(long)]
    pub data: String,

    /// Base64 signature
    #[arg(long)]
    pub signature: String,
}

impl VerifyArgs {
    fn run(self, ctx: &Context) -> Result<VerifyOutput, CommandFailure> {
        let public_pem = keys::read_pem(&ctx.public_key_path(self.public_key)?)?;
        // A bad key file is an input error, not a failed verification.
        rsa::parse_public_key(&public_pem)?;
        Ok(VerifyOutput {
            valid: rsa::verify(&self.data, &self.signature, &public_pem),
        })
    }
}

#[derive(Parser, Debug)]
pub struct SealArgs {
    /// Public key PEM file (defaults to keys.public_key_path)
    #[arg(long)]
    pub public_key: Option<PathBuf>,

    #[arg(long)]
    pub text: String,
}

impl SealArgs {
    fn run(self, ctx: &Context) -> Result<ValueOutput, CommandFailure> {
        let public_pem = keys::read_pem(&ctx.public_key_path(self.public_key)?)?;
        Ok(ValueOutput {
            label: "Ciphertext",
            value: rsa::encrypt(&self.text, &public_pem)?,
        })
    }
}

#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// Private key PEM file (defaults to keys.private_key_path)
    #[arg(long)]
    pub private_key: Option<PathBuf>,

    /// Base64 RSA-OAEP ciphertext
    #[arg(long)]
    pub ciphertext: String,
}

impl OpenArgs {
    fn run(self, ctx: &Context) -> Result<ValueOutput, CommandFailure> {
        let private_pem = keys::read_pem(&ctx.private_key_path(self.private_key)?)?;
        Ok(ValueOutput {
            label: "Plaintext",
            value: rsa::decrypt(&self.ciphertext, &private_pem)?,
        })
    }
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

impl ConfigArgs {
    fn execute(self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let path = ctx
            .config_path
            .clone()
            .or_else(Config::default_path)
            .ok_or_else(|| anyhow::anyhow!("no configuration directory on this platform"))?;

        let code = match self.action {
            ConfigAction::Show => ctx.finish("config show", Ok(ctx.config.clone())),
            ConfigAction::Path => ctx.finish(
                "config path",
                Ok(PathOutput {
                    exists: path.exists(),
                    path: path.display().to_string(),
                }),
            ),
            ConfigAction::Init { force } => {
                if force && path.exists() {
                    std::fs::remove_file(&path)?;
                }
                let created = Config::create_default_at(&path)?;
                if created {
                    ctx.formatter
                        .success(&format!("Wrote {}", path.display()));
                } else {
                    ctx.formatter.warning(&format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ));
                }
                ctx.finish(
                    "config init",
                    Ok(PathOutput {
                        exists: true,
                        path: path.display().to_string(),
                    }),
                )
            }
        };
        Ok(code)
    }
}
