use anyhow::{anyhow, Context};
use env_logger::Env;
use rustls::pki_types::CertificateDer;
use spki_pinner::pinning::certs::public_key_of;
use spki_pinner::pinning::{digest_spki_der, spki_digest};
use std::io::Cursor;
use std::{env, fs, path::PathBuf};
use x509_parser::prelude::*;

type CliResult<T> = Result<T, anyhow::Error>;

/// CLI entrypoint: prints the pin of every certificate in the given PEM files.
fn main() -> CliResult<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init()
        .ok();

    let paths = resolve_cert_paths()?;
    for path in paths {
        for cert in read_certs(&path)? {
            println!("{}", describe(&cert)?);
        }
    }
    Ok(())
}

/// Certificate files come from the command line, or `SPKI_PIN_CERT_PATH`.
fn resolve_cert_paths() -> CliResult<Vec<PathBuf>> {
    let args: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if !args.is_empty() {
        return Ok(args);
    }
    if let Ok(path) = env::var("SPKI_PIN_CERT_PATH") {
        return Ok(vec![PathBuf::from(path)]);
    }
    Err(anyhow!(
        "provide PEM certificate paths as arguments or set SPKI_PIN_CERT_PATH"
    ))
}

fn read_certs(path: &PathBuf) -> CliResult<Vec<CertificateDer<'static>>> {
    let bytes = fs::read(path).with_context(|| format!("read {:?}", path))?;
    let certs = rustls_pemfile::certs(&mut Cursor::new(&bytes))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parse PEM in {:?}", path))?;
    anyhow::ensure!(!certs.is_empty(), "no certificates in {:?}", path);
    Ok(certs)
}

/// `<pin>  <subject>`, flagging keys the validator cannot match.
fn describe(cert: &CertificateDer<'_>) -> CliResult<String> {
    let (_, parsed) =
        parse_x509_certificate(cert.as_ref()).map_err(|e| anyhow!("parse certificate: {e}"))?;
    let subject = parsed.subject().to_string();
    let full_spki_pin = digest_spki_der(parsed.public_key().raw);

    let line = match public_key_of(cert.as_ref()).and_then(|k| spki_digest(k.spec, &k.raw_key)) {
        Ok(pin) => {
            if pin != full_spki_pin {
                tracing::warn!("{subject}: reconstructed SPKI differs from the certificate's own");
            }
            format!("{pin}  {subject}")
        }
        Err(err) => format!("{full_spki_pin}  {subject}  (not matchable: {err})"),
    };
    Ok(line)
}
