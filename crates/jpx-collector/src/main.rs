//! JPX 주식 데이터 수집 CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jpx_collector::modules::{self, CollectOptions};
use jpx_collector::{CollectionStats, CollectorConfig, CollectorError};
use jpx_data::{ArtifactStore, Period, YahooChartClient};

#[derive(Parser)]
#[command(name = "jpx-collector")]
#[command(about = "JPX Historical Stock Data Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// JPX 상장 기업 목록 다운로드
    DownloadListing,

    /// 종목코드 추출 결과만 출력 (시세 수집 안 함)
    ExtractCodes,

    /// 과거 시세 수집 (기존 목록 파일 사용)
    Collect {
        /// 특정 종목만 수집 (쉼표로 구분, 예: "7203,9984")
        #[arg(long)]
        codes: Option<String>,

        /// 수집 기간 (예: 1y, 5y, max; 숫자만 쓰면 연 단위)
        #[arg(long)]
        period: Option<String>,

        /// 동시 수집 워커 수
        #[arg(long)]
        workers: Option<usize>,
    },

    /// 전체 워크플로우 실행 (목록 다운로드 → 종목코드 추출 → 시세 수집)
    RunAll {
        /// 목록 다운로드 건너뛰기 (기존 파일 사용)
        #[arg(long)]
        skip_download: bool,

        /// 수집 기간 (예: 1y, 5y, max; 숫자만 쓰면 연 단위)
        #[arg(long)]
        period: Option<String>,

        /// 동시 수집 워커 수
        #[arg(long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("jpx_collector={0},jpx_data={0}", cli.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("JPX Stock Data Collector 시작");

    let config = CollectorConfig::from_env();

    match cli.command {
        Commands::DownloadListing => {
            let bytes = modules::download_listing(&config).await?;
            tracing::info!(file = %config.listing.file, bytes = bytes, "목록 다운로드 완료");
        }
        Commands::ExtractCodes => {
            let codes = modules::load_codes(&config)?;
            println!("종목코드 {}개:", codes.len());
            for code in codes.iter().take(10) {
                println!("  {code}");
            }
            if codes.len() > 10 {
                println!("  ... 외 {}개", codes.len() - 10);
            }
        }
        Commands::Collect {
            codes,
            period,
            workers,
        } => {
            let codes = match codes {
                Some(ref list) => list
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
                None => modules::load_codes(&config)?,
            };

            let stats = run_collect(&config, &codes, period, workers).await?;
            exit_on_no_progress(&stats);
        }
        Commands::RunAll {
            skip_download,
            period,
            workers,
        } => {
            tracing::info!("=== 전체 워크플로우 시작 ===");

            tracing::info!("Step 1/2: 상장 기업 목록 동기화");
            let codes = modules::sync_listing(&config, skip_download).await?;

            tracing::info!("Step 2/2: 과거 시세 수집");
            let stats = run_collect(&config, &codes, period, workers).await?;

            tracing::info!("=== 전체 워크플로우 완료 ===");
            exit_on_no_progress(&stats);
        }
    }

    tracing::info!("JPX Stock Data Collector 종료");
    Ok(())
}

/// 수집 실행: CLI 인자가 환경 설정을 덮어씁니다.
async fn run_collect(
    config: &CollectorConfig,
    codes: &[String],
    period: Option<String>,
    workers: Option<usize>,
) -> jpx_collector::Result<CollectionStats> {
    let period: Period = period
        .unwrap_or_else(|| config.collect.period.clone())
        .parse()
        .map_err(CollectorError::Data)?;

    let provider = Arc::new(YahooChartClient::new(config.retry_policy()));
    let store = ArtifactStore::new(&config.collect.output_dir, config.collect.min_artifact_bytes);
    let options = CollectOptions {
        workers: workers.unwrap_or(config.collect.workers).max(1),
        progress_interval: config.collect.progress_interval,
    };

    // Ctrl-C 수신 시 신규 제출을 중단하고 진행 중 작업만 드레인
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("종료 신호 수신 - 신규 제출 중단");
                cancel.cancel();
            }
        });
    }

    let stats =
        modules::collect_histories(provider, &store, codes, &period, &options, &cancel).await?;
    stats.log_summary("과거 시세 수집");

    Ok(stats)
}

/// 진척이 전혀 없으면 종료 코드 1로 종료
fn exit_on_no_progress(stats: &CollectionStats) {
    if !stats.made_progress() {
        tracing::error!("수집된 데이터가 없습니다");
        std::process::exit(1);
    }
}
