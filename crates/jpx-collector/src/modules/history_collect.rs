//! 과거 시세 일괄 수집 모듈 (핵심 오케스트레이터).
//!
//! 종목코드 목록을 고정 크기 워커 풀에 배분하여 종목별 과거 시세를
//! 독립적으로 수집합니다. 유효한 아티팩트가 이미 있는 종목은 제출 전에
//! 건너뛰므로, 부분 완료된 배치를 재실행하면 남은 작업만 수행됩니다.
//! 개별 종목의 실패는 배치를 중단시키지 않습니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jpx_data::{ArtifactStore, DataError, HistoryProvider, Period};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{CollectionStats, Result};

/// 일괄 수집 동작 옵션
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// 동시 수집 워커 수 (1 이상)
    pub workers: usize,
    /// 진행률 로그 주기 (완료 건수 기준)
    pub progress_interval: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            workers: 5,
            progress_interval: 50,
        }
    }
}

/// 종목별 수집 결과
enum Outcome {
    /// 새 아티팩트 저장 완료
    Success { rows: usize, bytes: u64 },
    /// 조회 실패, 데이터 없음, 또는 크기 미달
    Failure,
}

/// 과거 시세 일괄 수집.
///
/// 완료 순서는 제출 순서와 무관하며, 통계는 완료 시점마다 한 번씩 갱신됩니다.
/// `cancel`이 발동되면 신규 제출을 중단하고 진행 중인 작업만 마친 뒤
/// 부분 통계를 반환합니다. 출력 디렉토리 생성 실패만 치명적 오류입니다.
pub async fn collect_histories(
    provider: Arc<dyn HistoryProvider>,
    store: &ArtifactStore,
    codes: &[String],
    period: &Period,
    options: &CollectOptions,
    cancel: &CancellationToken,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();
    stats.total = codes.len();

    store.ensure()?;

    if codes.is_empty() {
        tracing::info!("수집할 종목이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    // 재개 검사: 유효한 아티팩트가 이미 있는 종목은 제출하지 않음
    let mut pending: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        if store.is_valid(code) {
            stats.skipped += 1;
            tracing::debug!(code = %code, "아티팩트 존재 - 건너뛰기");
        } else {
            pending.push(code.clone());
        }
    }

    tracing::info!(
        total = codes.len(),
        pending = pending.len(),
        skipped = stats.skipped,
        workers = options.workers,
        period = %period,
        "과거 시세 수집 시작"
    );

    let workers = options.workers.max(1);
    let mut progress = ProgressTracker::new(pending.len(), options.progress_interval.max(1));
    let mut tasks: JoinSet<(String, Outcome, Duration)> = JoinSet::new();
    let mut queue = pending.into_iter();

    loop {
        // 워커 수만큼 채워서 제출. 취소되면 신규 제출만 중단하고
        // 진행 중인 작업은 아래 join 루프에서 드레인합니다.
        while tasks.len() < workers && !cancel.is_cancelled() {
            let Some(code) = queue.next() else { break };

            let provider = Arc::clone(&provider);
            let store = store.clone();
            let period = period.clone();

            tasks.spawn(async move {
                let item_start = Instant::now();
                let outcome = fetch_one(provider.as_ref(), &store, &code, &period).await;
                (code, outcome, item_start.elapsed())
            });
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };

        match joined {
            Ok((code, Outcome::Success { rows, bytes }, elapsed)) => {
                stats.success += 1;
                stats.total_rows += rows;
                tracing::info!(code = %code, rows = rows, bytes = bytes, "수집 완료");
                progress.record(elapsed);
            }
            Ok((_, Outcome::Failure, elapsed)) => {
                stats.errors += 1;
                progress.record(elapsed);
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(error = %e, "수집 작업 비정상 종료");
                progress.record(Duration::ZERO);
            }
        }

        progress.maybe_log();
    }

    if cancel.is_cancelled() {
        let remaining = queue.count();
        tracing::warn!(
            remaining = remaining,
            completed = progress.completed,
            "취소됨 - 부분 통계 반환"
        );
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 종목 하나 수집: 조회 → 저장 → 크기 검증.
///
/// 크기 미달 아티팩트는 삭제하여 다음 실행에서 재시도 대상이 되게 합니다.
async fn fetch_one(
    provider: &dyn HistoryProvider,
    store: &ArtifactStore,
    code: &str,
    period: &Period,
) -> Outcome {
    let bars = match provider.fetch_history(code, period).await {
        Ok(bars) => bars,
        Err(DataError::NoData(_)) => {
            tracing::warn!(code = code, "데이터 없음 (상장폐지 또는 잘못된 종목코드)");
            return Outcome::Failure;
        }
        Err(e) => {
            tracing::error!(code = code, error = %e, "시세 조회 실패");
            return Outcome::Failure;
        }
    };

    let bytes = match store.write_bars(code, &bars) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(code = code, error = %e, "아티팩트 저장 실패");
            let _ = store.delete(code);
            return Outcome::Failure;
        }
    };

    if bytes <= store.min_bytes() {
        tracing::warn!(
            code = code,
            bytes = bytes,
            min_bytes = store.min_bytes(),
            "아티팩트 크기 미달 - 삭제"
        );
        if let Err(e) = store.delete(code) {
            tracing::error!(code = code, error = %e, "크기 미달 아티팩트 삭제 실패");
        }
        return Outcome::Failure;
    }

    Outcome::Success {
        rows: bars.len(),
        bytes,
    }
}

/// 진행률 및 ETA 트래커.
///
/// 최근 완료 건의 이동 평균으로 남은 시간을 추정합니다. 관측용 로그일 뿐
/// 제어 흐름에는 영향을 주지 않습니다.
struct ProgressTracker {
    started: Instant,
    completed: usize,
    total: usize,
    interval: usize,
    recent: Vec<Duration>,
    window: usize,
}

impl ProgressTracker {
    fn new(total: usize, interval: usize) -> Self {
        Self {
            started: Instant::now(),
            completed: 0,
            total,
            interval,
            recent: Vec::with_capacity(50),
            window: 50,
        }
    }

    /// 완료 건 기록 및 이동 평균 갱신
    fn record(&mut self, elapsed: Duration) {
        self.completed += 1;
        if self.recent.len() >= self.window {
            self.recent.remove(0);
        }
        self.recent.push(elapsed);
    }

    /// 이동 평균 기반 남은 시간 추정
    fn estimated_remaining(&self) -> Option<Duration> {
        if self.recent.is_empty() || self.completed == 0 {
            return None;
        }
        let avg: Duration = self.recent.iter().sum::<Duration>() / self.recent.len() as u32;
        let remaining = self.total.saturating_sub(self.completed);
        Some(avg * remaining as u32)
    }

    /// 주기에 도달했으면 진행률 로그 출력
    fn maybe_log(&self) {
        if !self.should_log() {
            return;
        }

        let percent = if self.total > 0 {
            (self.completed * 100) / self.total
        } else {
            100
        };
        let eta = self
            .estimated_remaining()
            .map(format_duration)
            .unwrap_or_else(|| "계산 중".to_string());

        tracing::info!(
            "[{}/{}] ({}%) | ETA: {} | 경과: {}",
            self.completed,
            self.total,
            percent,
            eta,
            format_duration(self.started.elapsed()),
        );
    }

    fn should_log(&self) -> bool {
        self.completed > 0 && (self.completed % self.interval == 0 || self.completed == self.total)
    }
}

/// Duration을 사람이 읽기 쉬운 문자열로 변환
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
