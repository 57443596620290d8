//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use jpx_data::provider::listing::JPX_LISTING_URL;
use jpx_data::RetryPolicy;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 상장 기업 목록 설정
    pub listing: ListingConfig,
    /// 과거 시세 수집 설정
    pub collect: CollectConfig,
}

/// 상장 기업 목록 설정
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// 목록 다운로드 URL
    pub url: String,
    /// 목록 저장 경로 (종목코드 추출 입력)
    pub file: String,
}

/// 과거 시세 수집 설정
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// 아티팩트 출력 디렉토리
    pub output_dir: String,
    /// 기본 수집 기간 (예: 5y)
    pub period: String,
    /// 동시 수집 워커 수 (1 이상)
    pub workers: usize,
    /// 아티팩트 유효 판정 최소 크기 (바이트)
    pub min_artifact_bytes: u64,
    /// 조회 최대 시도 횟수
    pub fetch_max_attempts: u32,
    /// 시도 간 대기 시간 (밀리초)
    pub fetch_retry_delay_ms: u64,
    /// 진행률 로그 주기 (완료 건수 기준)
    pub progress_interval: usize,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (모든 값에 기본값 존재)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            listing: ListingConfig {
                url: env_var_or("JPX_LISTING_URL", JPX_LISTING_URL),
                file: env_var_or("LISTING_FILE", "data_j.csv"),
            },
            collect: CollectConfig {
                output_dir: env_var_or("OUTPUT_DIR", "jp_all"),
                period: env_var_or("COLLECT_PERIOD", "5y"),
                workers: env_var_parse::<usize>("COLLECT_WORKERS", 5).max(1),
                min_artifact_bytes: env_var_parse("MIN_ARTIFACT_BYTES", 100),
                fetch_max_attempts: env_var_parse::<u32>("FETCH_MAX_ATTEMPTS", 3).max(1),
                fetch_retry_delay_ms: env_var_parse("FETCH_RETRY_DELAY_MS", 2000),
                progress_interval: env_var_parse::<usize>("PROGRESS_INTERVAL", 50).max(1),
            },
        }
    }

    /// 조회 재시도 정책 반환
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.collect.fetch_max_attempts,
            delay: Duration::from_millis(self.collect.fetch_retry_delay_ms),
        }
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 문자열 로드 (없으면 기본값 사용)
fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
