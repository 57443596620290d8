//! 종목별 CSV 아티팩트 저장소.
//!
//! 출력 디렉토리에 종목코드당 파일 하나(`<code>.stock.csv`)를 저장합니다.
//! "파일이 존재하고 최소 크기를 넘는다"가 곧 완료 판정이므로,
//! 이 디렉토리 자체가 재실행 시 건너뛰기의 원장 역할을 합니다.
//! 별도 상태 파일은 없습니다.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::provider::history::DailyBar;

/// 종목별 아티팩트 저장소
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    base_dir: PathBuf,
    min_bytes: u64,
}

impl ArtifactStore {
    /// 지정 디렉토리와 최소 크기 임계값으로 생성
    pub fn new(base_dir: impl Into<PathBuf>, min_bytes: u64) -> Self {
        Self {
            base_dir: base_dir.into(),
            min_bytes,
        }
    }

    /// 출력 디렉토리 반환
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 유효 판정 임계값 (바이트)
    pub fn min_bytes(&self) -> u64 {
        self.min_bytes
    }

    /// 출력 디렉토리 생성 (이미 있으면 무시)
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base_dir)
    }

    /// 종목코드에 대한 아티팩트 경로 (결정적)
    pub fn path_for(&self, code: &str) -> PathBuf {
        self.base_dir.join(format!("{code}.stock.csv"))
    }

    /// 아티팩트가 존재하고 최소 크기를 넘는지 확인.
    ///
    /// 크기 검사는 잘린 파일을 걸러내는 휴리스틱이며 내용 검증은 아닙니다.
    pub fn is_valid(&self, code: &str) -> bool {
        std::fs::metadata(self.path_for(code))
            .map(|m| m.is_file() && m.len() > self.min_bytes)
            .unwrap_or(false)
    }

    /// 일봉 목록을 CSV로 저장하고 기록된 바이트 수를 반환
    pub fn write_bars(&self, code: &str, bars: &[DailyBar]) -> Result<u64> {
        let path = self.path_for(code);
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "date,open,high,low,close,volume")?;
        for bar in bars {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                bar.date.format("%Y-%m-%d"),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            )?;
        }
        writer.flush()?;

        Ok(std::fs::metadata(&path)?.len())
    }

    /// 아티팩트 삭제 (없으면 무시)
    pub fn delete(&self, code: &str) -> std::io::Result<()> {
        match std::fs::remove_file(self.path_for(code)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn sample_bars(count: usize) -> Vec<DailyBar> {
        (0..count)
            .map(|i| DailyBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: Decimal::new(25000, 1),
                high: Decimal::new(25500, 1),
                low: Decimal::new(24800, 1),
                close: Decimal::new(25300, 1),
                volume: 100_000,
            })
            .collect()
    }

    #[test]
    fn test_path_for() {
        let store = ArtifactStore::new("jp_all", 100);
        assert_eq!(
            store.path_for("7203"),
            PathBuf::from("jp_all/7203.stock.csv")
        );
    }

    #[test]
    fn test_write_and_validate() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 100);
        store.ensure().unwrap();

        let bytes = store.write_bars("7203", &sample_bars(5)).unwrap();
        assert!(bytes > 100);
        assert!(store.is_valid("7203"));

        let content = std::fs::read_to_string(store.path_for("7203")).unwrap();
        assert!(content.starts_with("date,open,high,low,close,volume\n"));
        assert!(content.contains("2024-01-01,"));
        // 헤더 + 5행
        assert_eq!(content.lines().count(), 6);
    }

    #[test]
    fn test_missing_artifact_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 100);
        assert!(!store.is_valid("7203"));
    }

    #[test]
    fn test_threshold_boundary_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 100);
        store.ensure().unwrap();

        // 정확히 임계값 크기인 파일은 유효하지 않음 (초과해야 함)
        std::fs::write(store.path_for("9984"), vec![b'x'; 100]).unwrap();
        assert!(!store.is_valid("9984"));

        std::fs::write(store.path_for("9984"), vec![b'x'; 101]).unwrap();
        assert!(store.is_valid("9984"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 100);
        store.ensure().unwrap();

        store.write_bars("7203", &sample_bars(5)).unwrap();
        store.delete("7203").unwrap();
        assert!(!store.path_for("7203").exists());

        // 없는 파일 삭제도 오류 아님
        store.delete("7203").unwrap();
    }
}
