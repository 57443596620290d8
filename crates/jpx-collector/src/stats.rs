//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 대상 종목 수
    pub total: usize,
    /// 성공 횟수 (새 아티팩트 저장)
    pub success: usize,
    /// 실패 횟수 (재시도 소진, 데이터 없음, 크기 미달)
    pub errors: usize,
    /// 건너뛴 횟수 (유효한 아티팩트 이미 존재)
    pub skipped: usize,
    /// 저장된 총 일봉 행 수
    pub total_rows: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 측정 가능한 진척 여부 (성공 또는 건너뛰기가 하나라도 있으면 true).
    ///
    /// 프로세스 종료 코드 결정에 사용합니다.
    pub fn made_progress(&self) -> bool {
        self.success + self.skipped > 0
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            total_rows = self.total_rows,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
