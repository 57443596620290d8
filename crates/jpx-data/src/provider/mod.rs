//! 데이터 Provider 모듈.
//!
//! ## JPX 상장 기업 목록
//! - `ListingClient`: 상장 기업 목록 다운로드 (고정 URL)
//! - `extract_stock_codes`: 목록 파일의 코드 컬럼에서 4자리 종목코드 추출
//!
//! ## Yahoo Finance 과거 시세
//! - `YahooChartClient`: chart API v8 기반 일봉 조회 (재시도 내장)
//! - `HistoryProvider`: 조회 추상화 trait (테스트 mock 주입용)

pub mod history;
pub mod listing;

pub use history::{DailyBar, HistoryProvider, Period, RetryPolicy, YahooChartClient};
pub use listing::{extract_stock_codes, ListingClient};
