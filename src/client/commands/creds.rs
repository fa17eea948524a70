use std::fs;
use std::path::PathBuf;

use crate::client::commands::output::print_error;
use crate::client::credentials;

#[derive(clap::Subcommand)]
#[command(after_long_help = "\
EXAMPLES:
    # Generate a fresh private key
    fahctl creds generate-key --out api-private.pem

    # Produce a CSR to submit to the assignment server operators
    fahctl creds generate-csr --key-file api-private.pem \\
        --common-name researcher@example.org --out api-csr.pem
")]
pub enum CredCommands {
    /// Generate a new 4096-bit RSA private key
    GenerateKey {
        /// Where to write the PEM private key
        #[arg(long, default_value = "api-private.pem")]
        out: PathBuf,
    },
    /// Generate a certificate signing request from an existing key
    ///
    /// Submit the CSR to the assignment server operators; the signed
    /// certificate comes back out of band and pairs with the key file.
    GenerateCsr {
        /// Path to the PEM private key
        #[arg(long, default_value = "api-private.pem")]
        key_file: PathBuf,
        /// Subject common name, typically your contact email
        #[arg(long, required = true)]
        common_name: String,
        /// Where to write the PEM CSR
        #[arg(long, default_value = "api-csr.pem")]
        out: PathBuf,
    },
}

pub fn handle_cred_commands(command: &CredCommands) {
    match command {
        CredCommands::GenerateKey { out } => {
            let key = match credentials::create_key() {
                Ok(key) => key,
                Err(e) => {
                    print_error("generating key", &e);
                    std::process::exit(1);
                }
            };
            match credentials::write_key(&key, out) {
                Ok(()) => println!("Wrote private key to {}", out.display()),
                Err(e) => {
                    print_error("writing key", &e);
                    std::process::exit(1);
                }
            }
        }
        CredCommands::GenerateCsr {
            key_file,
            common_name,
            out,
        } => {
            let key = match credentials::read_key(key_file) {
                Ok(key) => key,
                Err(e) => {
                    print_error("reading key", &e);
                    std::process::exit(1);
                }
            };
            let csr = match credentials::generate_csr(&key, common_name) {
                Ok(csr) => csr,
                Err(e) => {
                    print_error("generating CSR", &e);
                    std::process::exit(1);
                }
            };
            match fs::write(out, csr) {
                Ok(()) => println!("Wrote CSR to {}", out.display()),
                Err(e) => {
                    print_error("writing CSR", &e);
                    std::process::exit(1);
                }
            }
        }
    }
}
