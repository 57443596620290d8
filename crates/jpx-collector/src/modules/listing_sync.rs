//! 상장 기업 목록 동기화 모듈.
//!
//! JPX 목록을 내려받아 로컬 파일로 저장하고 4자리 종목코드를 추출합니다.
//! 종목코드가 하나도 나오지 않으면 수집할 작업 자체가 없으므로
//! 배치 전체에 대해 치명적 오류로 처리합니다.

use std::path::Path;

use jpx_data::{extract_stock_codes, ListingClient};

use crate::{CollectorConfig, CollectorError, Result};

/// 상장 기업 목록 다운로드 (저장된 바이트 수 반환)
pub async fn download_listing(config: &CollectorConfig) -> Result<u64> {
    let client = ListingClient::new(&config.listing.url);
    let bytes = client.download(Path::new(&config.listing.file)).await?;
    Ok(bytes)
}

/// 목록 파일에서 종목코드 로드.
///
/// 비어 있으면 치명적 오류 (수집 대상이 없음).
pub fn load_codes(config: &CollectorConfig) -> Result<Vec<String>> {
    let codes = extract_stock_codes(Path::new(&config.listing.file))?;

    if codes.is_empty() {
        return Err(CollectorError::DataSource(format!(
            "no stock codes found in listing file: {}",
            config.listing.file
        )));
    }

    tracing::info!(count = codes.len(), "종목코드 추출 완료");
    Ok(codes)
}

/// 목록 동기화: 다운로드(선택) + 종목코드 추출
pub async fn sync_listing(config: &CollectorConfig, skip_download: bool) -> Result<Vec<String>> {
    if skip_download {
        tracing::info!(file = %config.listing.file, "목록 다운로드 건너뛰기 (기존 파일 사용)");
    } else {
        download_listing(config).await?;
    }

    load_codes(config)
}
