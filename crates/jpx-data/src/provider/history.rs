//! Yahoo Finance 과거 시세 조회.
//!
//! chart API v8로 일봉 데이터를 조회합니다. 도쿄증권거래소 종목은
//! `<종목코드>.T` 심볼로 조회하며, 조정 종가가 있으면 우선 사용합니다.
//! 일시적 실패(타임아웃, 빈 응답)는 고정 딜레이로 재시도하고,
//! 호출자는 최종 결과(데이터 / 데이터 없음 / 오류)만 관찰합니다.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{DataError, Result};

/// Yahoo Finance chart API 기본 URL
pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// 조회 기간 토큰 (`1y`, `5y`, `max` 등).
///
/// 숫자만 주어지면 연 단위로 해석합니다 (`"5"` → `"5y"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period(String);

impl Period {
    /// 내부 토큰 반환
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DataError::InvalidData("period is empty".to_string()));
        }

        // 숫자만 있으면 연 단위로 해석 (원래 동작 유지)
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self(format!("{trimmed}y")));
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower == "ytd" || lower == "max" {
            return Ok(Self(lower));
        }

        // <숫자><단위> 형태: d(일), mo(월), y(년)
        for unit in ["mo", "d", "y"] {
            if let Some(num) = lower.strip_suffix(unit) {
                if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) {
                    return Ok(Self(lower));
                }
            }
        }

        Err(DataError::InvalidData(format!("invalid period: {trimmed}")))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 일봉 데이터 포인트
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

/// 재시도 정책 (고정 딜레이)
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 최대 시도 횟수
    pub max_attempts: u32,
    /// 시도 간 대기 시간
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(2000),
        }
    }
}

/// 과거 시세 조회 추상화.
///
/// 오케스트레이터는 이 trait만 의존하므로 테스트에서 mock을 주입할 수 있습니다.
/// 빈 결과는 `DataError::NoData`로 구분해 반환해야 합니다.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// 종목코드와 기간으로 일봉 목록 조회 (날짜 오름차순)
    async fn fetch_history(&self, code: &str, period: &Period) -> Result<Vec<DailyBar>>;
}

/// Yahoo Finance chart API v8 응답 구조
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
    #[serde(rename = "adjclose")]
    adj_close: Option<Vec<ChartAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

#[derive(Debug, Deserialize)]
struct ChartAdjClose {
    #[serde(rename = "adjclose")]
    adj_close: Option<Vec<Option<f64>>>,
}

/// Yahoo Finance chart API 클라이언트
pub struct YahooChartClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl YahooChartClient {
    /// 지정 재시도 정책으로 생성
    pub fn new(retry: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("HTTP 클라이언트 생성 실패");

        Self {
            client,
            base_url: YAHOO_CHART_BASE_URL.to_string(),
            retry,
        }
    }

    /// 기본 URL 교체 (테스트용 mock 서버 주입)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 도쿄증권거래소 심볼 생성 (`7203` → `7203.T`)
    pub fn yahoo_symbol(code: &str) -> String {
        format!("{code}.T")
    }

    /// 단일 조회 시도 (재시도 없음)
    async fn fetch_once(&self, code: &str, period: &Period) -> Result<Vec<DailyBar>> {
        let symbol = Self::yahoo_symbol(code);
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d&events=history",
            self.base_url, symbol, period
        );

        tracing::debug!(code = code, url = %url, "Yahoo Finance 조회");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "Yahoo Finance API error: HTTP {}",
                response.status()
            )));
        }

        let chart: ChartResponse = serde_json::from_str(&response.text().await?)?;

        if let Some(error) = chart.chart.error {
            return Err(DataError::FetchError(format!(
                "Yahoo Finance error: {} - {}",
                error.code, error.description
            )));
        }

        let result = chart
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| DataError::NoData(code.to_string()))?;

        let bars = parse_chart_result(result);
        if bars.is_empty() {
            return Err(DataError::NoData(code.to_string()));
        }

        Ok(bars)
    }
}

#[async_trait]
impl HistoryProvider for YahooChartClient {
    async fn fetch_history(&self, code: &str, period: &Period) -> Result<Vec<DailyBar>> {
        let mut last_err = DataError::NoData(code.to_string());

        for attempt in 1..=self.retry.max_attempts.max(1) {
            match self.fetch_once(code, period).await {
                Ok(bars) => {
                    tracing::debug!(code = code, bars = bars.len(), attempt, "시세 조회 성공");
                    return Ok(bars);
                }
                Err(e) => {
                    if attempt < self.retry.max_attempts {
                        tracing::debug!(
                            code = code,
                            attempt = attempt,
                            max_attempts = self.retry.max_attempts,
                            error = %e,
                            "시세 조회 재시도 예정"
                        );
                        tokio::time::sleep(self.retry.delay).await;
                    } else {
                        tracing::warn!(
                            code = code,
                            attempts = self.retry.max_attempts,
                            error = %e,
                            "시세 조회 최종 실패"
                        );
                    }
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

/// chart API 결과를 일봉 목록으로 변환.
///
/// 필드가 하나라도 null인 행은 제외하고, 조정 종가가 있으면 종가 대신 사용합니다.
fn parse_chart_result(result: ChartResult) -> Vec<DailyBar> {
    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Vec::new();
    };

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let adj_closes = result
        .indicators
        .adj_close
        .and_then(|ac| ac.into_iter().next())
        .and_then(|ac| ac.adj_close);

    let mut bars = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        let open = opens.get(i).and_then(|v| *v);
        let high = highs.get(i).and_then(|v| *v);
        let low = lows.get(i).and_then(|v| *v);
        let close = adj_closes
            .as_ref()
            .and_then(|ac| ac.get(i).and_then(|v| *v))
            .or_else(|| closes.get(i).and_then(|v| *v));
        let volume = volumes.get(i).and_then(|v| *v);

        let (Some(o), Some(h), Some(l), Some(c), Some(v)) = (open, high, low, close, volume)
        else {
            continue;
        };

        let Some(date) = chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };

        bars.push(DailyBar {
            date,
            open: to_decimal(o),
            high: to_decimal(h),
            low: to_decimal(l),
            close: to_decimal(c),
            volume: v,
        });
    }

    // 날짜순 정렬 (오래된 것부터)
    bars.sort_by_key(|b| b.date);
    bars
}

/// f64 가격을 소수점 4자리 Decimal로 변환
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_str(&format!("{value:.4}")).unwrap_or_default()
}
