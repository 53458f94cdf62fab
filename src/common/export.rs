// src/common/export.rs

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::common::error::AppError;

/// Linhas prontas para virar CSV: cabeçalho ordenado + valores na mesma ordem.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: &'static str,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Qualquer registro que sabe se apresentar como linha de CSV.
pub trait CsvRow {
    fn header() -> Vec<&'static str>;
    fn values(&self) -> Vec<String>;
}

impl CsvExport {
    pub fn from_rows<T: CsvRow>(filename: &'static str, rows: &[T]) -> Self {
        Self {
            filename,
            header: T::header().into_iter().map(str::to_string).collect(),
            rows: rows.iter().map(CsvRow::values).collect(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AppError> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Falha ao finalizar CSV: {}", e)))
    }

    pub fn into_response(self) -> Result<Response, AppError> {
        let body = self.to_bytes()?;
        let disposition = format!("attachment; filename=\"{}\"", self.filename);

        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            body,
        )
            .into_response())
    }
}

/// `?export=1` liga a resposta em CSV em vez de JSON.
pub fn wants_export(flag: Option<u8>) -> bool {
    flag == Some(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair(&'static str, i32);

    impl CsvRow for Pair {
        fn header() -> Vec<&'static str> {
            vec!["name", "score"]
        }

        fn values(&self) -> Vec<String> {
            vec![self.0.to_string(), self.1.to_string()]
        }
    }

    #[test]
    fn writes_header_then_rows_in_order() {
        let export = CsvExport::from_rows("pairs.csv", &[Pair("ana", 3), Pair("bruno, jr", 4)]);
        let text = String::from_utf8(export.to_bytes().unwrap()).unwrap();

        assert_eq!(text, "name,score\nana,3\n\"bruno, jr\",4\n");
    }

    #[test]
    fn empty_export_still_has_header() {
        let export = CsvExport::from_rows::<Pair>("pairs.csv", &[]);
        let text = String::from_utf8(export.to_bytes().unwrap()).unwrap();

        assert_eq!(text, "name,score\n");
    }

    #[test]
    fn only_export_one_triggers_csv() {
        assert!(wants_export(Some(1)));
        assert!(!wants_export(Some(0)));
        assert!(!wants_export(None));
    }
}
