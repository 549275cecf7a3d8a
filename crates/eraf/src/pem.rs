//! PEM parsing of the certificate fields and rustls configuration built from them.
//!
//! The `certificate`, `private_key` and `root_certificate` fields conventionally
//! hold PEM text. These helpers parse them with `rustls-pemfile` and hand the
//! DER values to rustls. They operate on whatever bytes are stored, so a
//! sealed container must be opened first.

use std::io::BufReader;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore, ServerConfig};

use crate::container::Container;
use crate::error::ErafError;
use crate::field::Field;

fn non_empty(container: &Container, field: Field) -> Result<&[u8], ErafError> {
    let pem = container.field(field);
    if pem.is_empty() {
        return Err(ErafError::Certificate(format!("{field} field is empty")));
    }
    Ok(pem)
}

fn parse_certs(container: &Container, field: Field) -> Result<Vec<CertificateDer<'static>>, ErafError> {
    let pem = non_empty(container, field)?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(pem))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ErafError::Certificate(format!("failed to parse {field}: {e}")))?;
    if certs.is_empty() {
        return Err(ErafError::Certificate(format!("no certificate found in {field}")));
    }
    Ok(certs)
}

fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

impl Container {
    /// DER certificates from the PEM `certificate` field, leaf first.
    ///
    /// # Errors
    ///
    /// Returns [`ErafError::Certificate`] if the field is empty, malformed, or
    /// contains no `CERTIFICATE` block.
    pub fn certificate_chain(&self) -> Result<Vec<CertificateDer<'static>>, ErafError> {
        parse_certs(self, Field::Certificate)
    }

    /// DER certificates from the PEM `root_certificate` field.
    ///
    /// # Errors
    ///
    /// As [`Container::certificate_chain`].
    pub fn root_certificates(&self) -> Result<Vec<CertificateDer<'static>>, ErafError> {
        parse_certs(self, Field::RootCertificate)
    }

    /// The first private key (PKCS#1, PKCS#8 or SEC1) in the PEM `private_key` field.
    ///
    /// # Errors
    ///
    /// Returns [`ErafError::Certificate`] if the field is empty, malformed, or
    /// holds no private key.
    pub fn private_key(&self) -> Result<PrivateKeyDer<'static>, ErafError> {
        let pem = non_empty(self, Field::PrivateKey)?;
        rustls_pemfile::private_key(&mut BufReader::new(pem))
            .map_err(|e| ErafError::Certificate(format!("failed to parse private_key: {e}")))?
            .ok_or_else(|| ErafError::Certificate("no private key found in private_key".into()))
    }

    /// A root store trusting every certificate in the `root_certificate` field.
    ///
    /// # Errors
    ///
    /// As [`Container::root_certificates`], plus [`ErafError::Certificate`] if
    /// rustls rejects a certificate as a trust anchor.
    pub fn root_cert_store(&self) -> Result<RootCertStore, ErafError> {
        let mut store = RootCertStore::empty();
        for cert in self.root_certificates()? {
            store.add(cert)?;
        }
        Ok(store)
    }

    /// A TLS server configuration presenting `certificate` with `private_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErafError::Certificate`] if either field fails to parse or
    /// rustls rejects the pair.
    pub fn tls_server_config(&self) -> Result<Arc<ServerConfig>, ErafError> {
        let certs = self.certificate_chain()?;
        let key = self.private_key()?;
        let config = ServerConfig::builder_with_provider(provider())
            .with_safe_default_protocol_versions()?
            .with_no_client_auth()
            .with_single_cert(certs, key)?;
        Ok(Arc::new(config))
    }

    /// A TLS client configuration that trusts only `root_certificate`.
    ///
    /// # Errors
    ///
    /// As [`Container::root_cert_store`].
    pub fn tls_client_config(&self) -> Result<Arc<ClientConfig>, ErafError> {
        let roots = self.root_cert_store()?;
        let config = ClientConfig::builder_with_provider(provider())
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(Arc::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const CERT_PEM: &[u8] = include_bytes!("../testdata/localhost.crt");
    const KEY_PEM: &[u8] = include_bytes!("../testdata/localhost.key");

    fn with_tls_material() -> Container {
        Container::new()
            .with_field(Field::Certificate, CERT_PEM)
            .with_field(Field::PrivateKey, KEY_PEM)
            .with_field(Field::RootCertificate, CERT_PEM)
    }

    #[test]
    fn parses_certificate_and_key() {
        let c = with_tls_material();
        assert_eq!(c.certificate_chain().unwrap().len(), 1);
        assert_eq!(c.root_certificates().unwrap().len(), 1);
        assert!(matches!(c.private_key().unwrap(), PrivateKeyDer::Pkcs1(_)));
    }

    #[test]
    fn builds_tls_configs() {
        let c = with_tls_material();
        assert!(c.tls_server_config().is_ok());
        assert_eq!(c.root_cert_store().unwrap().len(), 1);
        assert!(c.tls_client_config().is_ok());
    }

    #[test]
    fn rejects_empty_fields() {
        let c = Container::new();
        let err = c.certificate_chain().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Certificate);
        assert!(err.to_string().contains("certificate field is empty"));
        assert!(c.private_key().unwrap_err().to_string().contains("private_key"));
        assert!(c.tls_server_config().is_err());
    }

    #[test]
    fn rejects_garbage_pem() {
        let c = Container::new()
            .with_field(Field::Certificate, "not a pem")
            .with_field(Field::PrivateKey, "also not a pem");
        assert_eq!(c.certificate_chain().unwrap_err().kind(), ErrorKind::Certificate);
        assert_eq!(c.private_key().unwrap_err().kind(), ErrorKind::Certificate);
    }

    #[test]
    fn sealed_material_does_not_parse() {
        let mut c = with_tls_material();
        c.seal_all_with_fresh_nonce([7u8; 32]).unwrap();
        assert!(c.tls_server_config().is_err());
        c.open_all_with_stored_nonce([7u8; 32]).unwrap();
        assert!(c.tls_server_config().is_ok());
    }
}
