use tracing_subscriber::EnvFilter;

/// 標準エラーへのログ出力を初期化
///
/// `RUST_LOG` があればそれに従う。なければ warn（`--verbose` 時は debug）。
/// 進捗表示は println で標準出力に出すので、ログとは混ざらない。
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // テストなどで二重に初期化された場合は既存の設定を使う
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    tracing::debug!("logging initialized (default level: {})", default_level);
}
