//! devcert CLI application.
//!
//! This binary provisions a local development certificate chain and offers
//! the individual steps (signing, verification, inspection) on their own.

use clap::{Parser, Subcommand};
use devcert::cert::inspect::{summarize_pem, CertificateSummary};
use devcert::cert::verify::verify_server_cert;
use devcert::config::ProvisionConfig;
use devcert::crypto::keys::KeyAlgorithm;
use devcert::error::Result;
use devcert::net::handshake::loopback_handshake;
use devcert::provision::{provision, sign_files, SignFiles};
use devcert::storage::artifacts::ArtifactPaths;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "devcert")]
#[command(version, about = "Provision a local development CA and server certificate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a CA and a CA-signed server certificate
    Provision {
        /// TOML profile with provisioning settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,

        /// CA subject (e.g., "CN=My Dev CA,O=My Org")
        #[arg(long)]
        ca_subject: Option<String>,

        /// Server certificate common name
        #[arg(long)]
        server_cn: Option<String>,

        /// DNS subject-alternative-name (repeatable)
        #[arg(long = "dns")]
        dns_names: Vec<String>,

        /// CA validity in days
        #[arg(long)]
        ca_days: Option<u32>,

        /// Server certificate validity in days
        #[arg(long)]
        days: Option<u32>,

        /// Key algorithm: rsa4096, rsa2048, ecdsa-p256 or ed25519
        #[arg(long)]
        key_algorithm: Option<KeyAlgorithm>,
    },

    /// Sign a CSR with an existing CA
    Sign {
        /// CA certificate file
        #[arg(long)]
        ca_cert: PathBuf,

        /// CA private key file
        #[arg(long)]
        ca_key: PathBuf,

        /// Certificate-signing request file
        #[arg(long)]
        csr: PathBuf,

        /// Request configuration document supplying the SAN list
        #[arg(long)]
        extfile: PathBuf,

        /// Output certificate file
        #[arg(long)]
        out: PathBuf,

        /// Validity in days
        #[arg(long, default_value = "3650")]
        days: u32,

        /// Serial file (default: next to the CA certificate, with .srl extension)
        #[arg(long)]
        serial_file: Option<PathBuf>,
    },

    /// Verify a server certificate against a CA certificate
    Verify {
        /// CA certificate file
        #[arg(long)]
        ca: PathBuf,

        /// Server certificate file
        #[arg(long)]
        cert: PathBuf,

        /// DNS name the certificate must be valid for (default: all SANs)
        #[arg(long)]
        dns: Option<String>,
    },

    /// Show the identity fields of a certificate
    Inspect {
        /// Certificate file
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a loopback TLS 1.2 handshake with a provisioned chain
    Handshake {
        /// Directory holding ca.crt, server.crt and server.key
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Name the client connects to
        #[arg(long, default_value = "localhost")]
        server_name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Provision {
            config,
            out,
            ca_subject,
            server_cn,
            dns_names,
            ca_days,
            days,
            key_algorithm,
        } => {
            let mut settings = match config {
                Some(path) => ProvisionConfig::load(&path)?,
                None => ProvisionConfig::default(),
            };

            if let Some(out) = out {
                settings.output_dir = out;
            }
            if let Some(subject) = ca_subject {
                settings.ca.subject = subject;
            }
            if let Some(cn) = server_cn {
                settings.server.common_name = cn;
            }
            if !dns_names.is_empty() {
                settings.server.dns_names = dns_names;
            }
            if let Some(days) = ca_days {
                settings.ca.validity_days = days;
            }
            if let Some(days) = days {
                settings.server.validity_days = days;
            }
            if let Some(algorithm) = key_algorithm {
                settings.key_algorithm = algorithm;
            }

            handle_provision(&settings)
        }

        Commands::Sign {
            ca_cert,
            ca_key,
            csr,
            extfile,
            out,
            days,
            serial_file,
        } => {
            let serial_file =
                serial_file.unwrap_or_else(|| SignFiles::default_serial_file(&ca_cert));
            let files = SignFiles {
                ca_cert,
                ca_key,
                csr,
                extfile,
                output: out,
                serial_file,
                validity_days: days,
            };
            sign_files(&files)?;

            println!("✓ Signed certificate: {}", files.output.display());
            println!("  Signed by: CA ({})", files.ca_cert.display());
            println!("  Serial file: {}", files.serial_file.display());
            println!("  Valid for: {} days", files.validity_days);

            Ok(())
        }

        Commands::Verify { ca, cert, dns } => {
            let ca_pem = fs::read_to_string(&ca)?;
            let cert_pem = fs::read_to_string(&cert)?;

            verify_server_cert(&ca_pem, &cert_pem, dns.as_deref())?;

            println!("✓ {} is valid against {}", cert.display(), ca.display());
            Ok(())
        }

        Commands::Inspect { file, json } => {
            let pem = fs::read_to_string(&file)?;
            let summary = summarize_pem(&pem)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }

        Commands::Handshake { dir, server_name } => {
            let paths = ArtifactPaths::in_dir(&dir.unwrap_or_else(|| PathBuf::from(".")));
            let ca_pem = fs::read_to_string(&paths.ca_cert)?;
            let cert_pem = fs::read_to_string(&paths.server_cert)?;
            let key_pem = fs::read_to_string(&paths.server_key)?;

            let report = loopback_handshake(&ca_pem, &cert_pem, &key_pem, &server_name).await?;

            println!("✓ TLS handshake succeeded for {}", report.server_name);
            println!("  Protocol: {}", report.protocol_version);
            println!("  Cipher suite: {}", report.cipher_suite);
            Ok(())
        }
    }
}

fn handle_provision(settings: &ProvisionConfig) -> Result<()> {
    let chain = provision(settings)?;

    println!(
        "✓ Provisioned development chain in: {}",
        settings.output_dir.display()
    );
    println!("  CA: {}", settings.ca.subject);
    println!("  Server: CN={}", settings.server.common_name);
    println!("  SANs: {}", chain.dns_names.join(", "));
    println!("  Key algorithm: {}", settings.key_algorithm);
    println!("  Files:");
    for path in chain.paths.all() {
        println!("    {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &CertificateSummary) {
    let format_time = |secs: i64| {
        chrono::DateTime::from_timestamp(secs, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    };

    println!("{:<12} {}", "Subject:", summary.subject);
    println!("{:<12} {}", "Issuer:", summary.issuer);
    println!("{:<12} {}", "Serial:", summary.serial_hex);
    println!("{:<12} {}", "Not before:", format_time(summary.not_before));
    println!("{:<12} {}", "Not after:", format_time(summary.not_after));
    println!("{:<12} {}", "Key:", summary.key_algorithm);
    println!("{:<12} {}", "CA:", if summary.is_ca { "yes" } else { "no" });
    if !summary.dns_names.is_empty() {
        println!("{:<12} {}", "DNS names:", summary.dns_names.join(", "));
    }
}
