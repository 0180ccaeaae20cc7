use thiserror::Error;

#[derive(Error, Debug)]
pub enum BidWriterError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("カタログ取得エラー: {0}")]
    CatalogFetch(String),

    #[error("カタログファイルが不正: {0}")]
    InvalidCatalog(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("作業指示 {0} の保存データが見つかりません")]
    StateNotFound(String),

    #[error("作業指示 {0} の保存データは既にあります（上書きする場合は --force）")]
    StateExists(String),

    #[error("作業指示番号が不正です: {0}")]
    InvalidWorkOrder(String),

    #[error("作業指示番号を指定してください（例: `bid-writer new 1234`）")]
    MissingWorkOrder,

    #[error("選択された明細がありません。`bid-writer toggle` で明細を選択してください")]
    NoBidsSelected,

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("見積エラー: {0}")]
    Core(#[from] bid_writer_common::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

pub type Result<T> = std::result::Result<T, BidWriterError>;
