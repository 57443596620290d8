//! JPX 상장 기업 목록 다운로드 및 종목코드 추출.
//!
//! JPX가 공개하는 상장 기업 목록을 받아 로컬 파일로 저장하고,
//! 코드 컬럼(`コード`)에서 일본 주식의 4자리 종목코드만 골라냅니다.
//! 4자리가 아닌 값(ETF 5자리, 신형 영문 혼합 코드 등)은 제외됩니다.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;

use crate::error::{DataError, Result};

/// JPX 상장 기업 목록 기본 URL
pub const JPX_LISTING_URL: &str =
    "https://www.jpx.co.jp/markets/statistics-equities/misc/tvdivq0000001vg2-att/data_j.xls";

/// 상장 기업 목록 다운로드 클라이언트
pub struct ListingClient {
    client: Client,
    url: String,
}

impl ListingClient {
    /// 지정 URL로 생성
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .expect("HTTP 클라이언트 생성 실패");

        Self {
            client,
            url: url.into(),
        }
    }

    /// 목록 URL 반환
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 상장 기업 목록을 받아 `dest`에 저장하고 바이트 수를 반환.
    ///
    /// 빈 응답은 오류로 처리합니다 (목록 없이 수집을 진행할 수 없음).
    pub async fn download(&self, dest: &Path) -> Result<u64> {
        tracing::info!(url = %self.url, "상장 기업 목록 다운로드 시작");

        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "listing request failed: HTTP {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(DataError::InvalidData(
                "listing response is empty".to_string(),
            ));
        }

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(dest, &bytes)?;

        tracing::info!(dest = %dest.display(), bytes = bytes.len(), "상장 기업 목록 저장 완료");
        Ok(bytes.len() as u64)
    }
}

/// 목록 파일(CSV)에서 4자리 종목코드를 추출.
///
/// 코드 컬럼은 `コード`를 우선 찾고, 없으면 `Code`/`code`로 대체합니다.
/// 숫자 이외 문자를 제거한 뒤 정확히 4자리인 값만 목록 순서대로 반환합니다.
pub fn extract_stock_codes(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let code_idx = headers
        .iter()
        .position(|h| h == "コード" || h.eq_ignore_ascii_case("code"))
        .ok_or_else(|| {
            DataError::InvalidData(format!(
                "code column not found in listing file: {}",
                path.display()
            ))
        })?;

    let mut codes = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(raw) = record.get(code_idx) else {
            continue;
        };

        // 숫자만 남기고 4자리인 값만 채택
        let clean: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if clean.len() == 4 {
            codes.push(clean);
        }
    }

    tracing::debug!(path = %path.display(), count = codes.len(), "종목코드 추출 완료");
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_listing(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_extract_stock_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_listing(
            &dir,
            "data_j.csv",
            "日付,コード,銘柄名,市場・商品区分\n\
             20240401,1301,極洋,プライム\n\
             20240401,7203,トヨタ自動車,プライム\n\
             20240401,130A,Veritas In Silico,グロース\n\
             20240401,13010,ETFサンプル,ETF\n\
             20240401,,空行,プライム\n\
             20240401,9984,ソフトバンクグループ,プライム\n",
        );

        let codes = extract_stock_codes(&path).unwrap();
        assert_eq!(codes, vec!["1301", "7203", "9984"]);
    }

    #[test]
    fn test_extract_stock_codes_english_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_listing(&dir, "list.csv", "Date,Code,Name\n20240401,6758,Sony\n");

        let codes = extract_stock_codes(&path).unwrap();
        assert_eq!(codes, vec!["6758"]);
    }

    #[test]
    fn test_extract_stock_codes_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_listing(&dir, "bad.csv", "日付,銘柄名\n20240401,極洋\n");

        let err = extract_stock_codes(&path).unwrap_err();
        assert!(matches!(err, DataError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_download_writes_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/listing/data_j.csv")
            .with_status(200)
            .with_body("日付,コード\n20240401,7203\n")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("data_j.csv");

        let client = ListingClient::new(format!("{}/listing/data_j.csv", server.url()));
        let bytes = client.download(&dest).await.unwrap();

        mock.assert_async().await;
        assert!(bytes > 0);
        let saved = std::fs::read_to_string(&dest).unwrap();
        assert!(saved.contains("7203"));
    }

    #[tokio::test]
    async fn test_download_empty_response_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/empty")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("data_j.csv");

        let client = ListingClient::new(format!("{}/empty", server.url()));
        let err = client.download(&dest).await.unwrap_err();
        assert!(matches!(err, DataError::InvalidData(_)));
        assert!(!dest.exists());
    }
}
