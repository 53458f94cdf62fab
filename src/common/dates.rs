// src/common/dates.rs

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::error::AppError;

/// Janela de datas inclusiva usada por estatísticas e dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Só `start` presente => janela de um único dia.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, AppError> {
        let start = start.ok_or_else(|| AppError::invalid("start_date é obrigatório"))?;
        let end = end.unwrap_or(start);

        if end < start {
            return Err(AppError::invalid("end_date não pode ser anterior a start_date"));
        }

        Ok(Self { start, end })
    }

    pub fn start_label(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_label(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Campos de data vindos de formulário: string vazia conta como ausente.
pub mod blank_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn start_only_is_a_single_day() {
        let w = DateWindow::resolve(Some(d("2024-03-01")), None).unwrap();
        assert_eq!(w.start, w.end);
        assert_eq!(w.end_label(), "2024-03-01");
    }

    #[test]
    fn missing_start_is_rejected() {
        assert!(matches!(
            DateWindow::resolve(None, Some(d("2024-03-01"))),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn reversed_window_is_rejected() {
        assert!(DateWindow::resolve(Some(d("2024-03-02")), Some(d("2024-03-01"))).is_err());
    }
}
