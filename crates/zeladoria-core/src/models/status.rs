use std::fmt;

use crate::location::LocationError;

/// Why a submission that reached the network did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkFailure {
    /// The server answered with a non-success status
    Rejected { status: u16 },
    /// No response was obtained
    Connection(String),
}

/// State of the capture/submit pipeline for a single form.
///
/// This is the only signal the form gives back to its user. Presentation
/// is kept in [`SubmissionStatus::message`] so front ends can render their
/// own text if they need to.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    CapturingLocation,
    LocationCaptured,
    LocationError(LocationError),
    Submitting,
    Success,
    ValidationError(String),
    NetworkError(NetworkFailure),
}

pub(crate) const MISSING_PHOTO_OR_LOCATION: &str =
    "Por favor, tire uma foto e capture a localização.";

impl SubmissionStatus {
    /// Human-readable message shown to the citizen.
    pub fn message(&self) -> String {
        match self {
            SubmissionStatus::Idle => String::new(),
            SubmissionStatus::CapturingLocation => "Buscando localização...".to_string(),
            SubmissionStatus::LocationCaptured => {
                "Localização capturada com sucesso!".to_string()
            }
            SubmissionStatus::LocationError(LocationError::Unsupported) => {
                "Geolocalização não suportada neste dispositivo.".to_string()
            }
            SubmissionStatus::LocationError(LocationError::PermissionDenied) => {
                "Erro: Por favor, permita o acesso à localização.".to_string()
            }
            SubmissionStatus::LocationError(_) => {
                "Erro: Não foi possível obter a localização. Tente novamente.".to_string()
            }
            SubmissionStatus::Submitting => "Enviando relato para a prefeitura...".to_string(),
            SubmissionStatus::Success => {
                "Sucesso! O problema foi relatado à prefeitura.".to_string()
            }
            SubmissionStatus::ValidationError(reason) => reason.clone(),
            SubmissionStatus::NetworkError(NetworkFailure::Rejected { .. }) => {
                "Erro ao enviar. Verifique os dados e tente novamente.".to_string()
            }
            SubmissionStatus::NetworkError(NetworkFailure::Connection(_)) => {
                "Erro de conexão com o servidor.".to_string()
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::LocationError(_)
                | SubmissionStatus::ValidationError(_)
                | SubmissionStatus::NetworkError(_)
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_has_no_message() {
        assert_eq!(SubmissionStatus::default(), SubmissionStatus::Idle);
        assert!(SubmissionStatus::Idle.message().is_empty());
    }

    #[test]
    fn test_network_failures_render_differently() {
        let rejected = SubmissionStatus::NetworkError(NetworkFailure::Rejected { status: 400 });
        let offline = SubmissionStatus::NetworkError(NetworkFailure::Connection(
            "connection refused".to_string(),
        ));
        assert!(rejected.message().contains("tente novamente"));
        assert_eq!(offline.message(), "Erro de conexão com o servidor.");
    }

    #[test]
    fn test_location_error_messages() {
        let denied = SubmissionStatus::LocationError(LocationError::PermissionDenied);
        assert!(denied.message().contains("permita o acesso"));
        let unsupported = SubmissionStatus::LocationError(LocationError::Unsupported);
        assert!(unsupported.message().contains("não suportada"));
    }

    #[test]
    fn test_error_classification() {
        assert!(SubmissionStatus::ValidationError("x".to_string()).is_error());
        assert!(SubmissionStatus::NetworkError(NetworkFailure::Rejected { status: 500 }).is_error());
        assert!(!SubmissionStatus::Success.is_error());
        assert!(!SubmissionStatus::Submitting.is_error());
    }
}
