//! B3 index-composition page client.
//!
//! The listed-indexes site renders its table from the `GetPortfolioDay` JSON
//! endpoint; request parameters (index, language, segment grouping, page
//! size) travel base64-encoded in the URL path. This client implements the
//! `IndexPage` contract over that endpoint and flattens result rows into the
//! same positional column order the on-page table shows, so the extractor
//! never sees the transport.

use crate::extract::{ExtractError, IndexPage, SECTOR_SEGMENT};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PORTFOLIO_DAY_URL: &str =
    "https://sistemaswebb3-listados.b3.com.br/indexProxy/indexCall/GetPortfolioDay";

/// Segment code for the sector grouping ("Setor de Atuação").
const SECTOR_SEGMENT_CODE: &str = "2";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioDayRequest<'a> {
    language: &'a str,
    page_number: u32,
    page_size: u32,
    index: &'a str,
    segment: &'a str,
}

#[derive(Debug, Deserialize)]
struct PortfolioDayResponse {
    results: Option<Vec<PortfolioEntry>>,
}

#[derive(Debug, Deserialize)]
struct PortfolioEntry {
    segment: Option<String>,
    cod: String,
    asset: String,
    #[serde(rename = "type")]
    asset_type: String,
    #[serde(rename = "theoricalQty")]
    theorical_qty: String,
    part: String,
    #[serde(rename = "partAcum")]
    part_acum: Option<String>,
}

/// `IndexPage` over the B3 JSON endpoint.
pub struct B3IndexPage {
    client: reqwest::blocking::Client,
    index: String,
    language: String,
    segment: Option<String>,
    page_size: u32,
}

impl B3IndexPage {
    pub fn new() -> Self {
        Self::for_index("IBOV")
    }

    pub fn for_index(index: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            index: index.to_string(),
            language: "pt-br".to_string(),
            segment: None,
            page_size: 20,
        }
    }

    fn request_token(&self, segment: &str) -> Result<String, ExtractError> {
        let request = PortfolioDayRequest {
            language: &self.language,
            page_number: 1,
            page_size: self.page_size,
            index: &self.index,
            segment,
        };
        let json = serde_json::to_string(&request)
            .map_err(|e| ExtractError::Page(format!("request encoding: {e}")))?;
        Ok(STANDARD.encode(json))
    }
}

impl Default for B3IndexPage {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexPage for B3IndexPage {
    fn select_segment(&mut self, label: &str) -> Result<(), ExtractError> {
        if label != SECTOR_SEGMENT {
            return Err(ExtractError::Page(format!(
                "unknown segment option '{label}'"
            )));
        }
        self.segment = Some(SECTOR_SEGMENT_CODE.to_string());
        Ok(())
    }

    fn select_page_size(&mut self, size: u32) -> Result<(), ExtractError> {
        self.page_size = size;
        Ok(())
    }

    fn table_rows(&mut self) -> Result<Option<Vec<Vec<String>>>, ExtractError> {
        let segment = self.segment.clone().ok_or_else(|| {
            ExtractError::Page("no segment selected before requesting rows".to_string())
        })?;

        let token = self.request_token(&segment)?;
        let url = format!("{PORTFOLIO_DAY_URL}/{token}");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ExtractError::Page(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Page(format!("HTTP {status} from index page")));
        }

        let body: PortfolioDayResponse = response
            .json()
            .map_err(|e| ExtractError::Page(format!("response parsing: {e}")))?;

        let Some(entries) = body.results else {
            return Ok(None);
        };
        if entries.is_empty() {
            return Ok(None);
        }

        let rows = entries
            .into_iter()
            .map(|entry| {
                vec![
                    entry.segment.unwrap_or_default(),
                    entry.cod,
                    entry.asset,
                    entry.asset_type,
                    entry.theorical_qty,
                    entry.part,
                    entry.part_acum.unwrap_or_default(),
                ]
            })
            .collect();
        Ok(Some(rows))
    }
}
