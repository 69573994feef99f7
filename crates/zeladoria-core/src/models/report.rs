use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::CategoryId;

/// Lifecycle of a report on the city side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportState {
    Recebido,
    EmAnalise,
    EquipeDespachada,
    Resolvido,
    Rejeitado,
}

impl ReportState {
    pub fn label(&self) -> &'static str {
        match self {
            ReportState::Recebido => "Recebido",
            ReportState::EmAnalise => "Em Análise",
            ReportState::EquipeDespachada => "Equipe no Local",
            ReportState::Resolvido => "Resolvido",
            ReportState::Rejeitado => "Rejeitado / Improcedente",
        }
    }

    /// Whether the city has finished handling the report
    pub fn is_closed(&self) -> bool {
        matches!(self, ReportState::Resolvido | ReportState::Rejeitado)
    }
}

/// One entry of a report's status timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistory {
    pub status: ReportState,
    #[serde(rename = "get_status_display", default)]
    pub status_display: Option<String>,
    #[serde(rename = "observacao_prefeitura", default)]
    pub city_note: Option<String>,
    #[serde(rename = "foto_resolucao", default)]
    pub resolution_photo: Option<String>,
    #[serde(rename = "data_atualizacao")]
    pub updated_at: DateTime<Utc>,
}

/// A submitted report as returned by `GET /api/relatos/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    #[serde(rename = "categoria")]
    pub category: CategoryId,
    #[serde(rename = "categoria_nome", default)]
    pub category_name: Option<String>,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "foto_problema", default)]
    pub photo_url: Option<String>,
    #[serde(rename = "endereco_aproximado", default)]
    pub approximate_address: Option<String>,
    #[serde(rename = "status_atual")]
    pub state: ReportState,
    #[serde(rename = "status_display", default)]
    pub state_display: Option<String>,
    #[serde(rename = "criado_em")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "historico", default)]
    pub history: Vec<StatusHistory>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Report {
    /// Label of the current state, preferring the server's wording
    pub fn state_label(&self) -> &str {
        self.state_display
            .as_deref()
            .unwrap_or_else(|| self.state.label())
    }

    /// Most recent note left by the city, if any.
    pub fn latest_note(&self) -> Option<&str> {
        self.history
            .iter()
            .max_by_key(|h| h.updated_at)
            .and_then(|h| h.city_note.as_deref())
            .filter(|note| !note.is_empty())
    }
}
