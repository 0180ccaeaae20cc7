use crate::export::ExportFormat;
use bid_writer_common::{Client, InstanceId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bid-writer")]
#[command(about = "見積書作成ツール（カタログ明細から見積書を組み立てて出力）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// カタログの読み込み元（.csv / .xlsx ファイルまたはURL）
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// オンラインのカタログ・価格表を取得しない
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// カタログを表示
    Catalog {
        /// 明細名・テンプレート・カテゴリ名で検索
        #[arg(short, long)]
        search: Option<String>,

        /// テンプレート本文も表示
        #[arg(long)]
        templates: bool,
    },

    /// 作業指示の見積シートを新規作成
    New {
        /// 作業指示番号（省略時は AutoSave_{時刻}）
        work_order: Option<String>,

        /// 既存の保存データを上書き
        #[arg(long)]
        force: bool,
    },

    /// 見積シートの明細を表示
    Show {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// カテゴリで絞り込み
        #[arg(short, long)]
        category: Option<String>,

        /// 明細名・テンプレート・カテゴリ名で検索
        #[arg(short, long)]
        search: Option<String>,
    },

    /// 明細のインスタンスを追加（#2, #3 ...）
    Add {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// 明細 ("カテゴリ/明細名")
        #[arg(required = true)]
        item: InstanceId,
    },

    /// 明細のインスタンスを削除（#1 は削除不可）
    Remove {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// インスタンス ("カテゴリ/明細名#番号")
        #[arg(required = true)]
        id: InstanceId,
    },

    /// 明細の入力値を設定
    Set {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// インスタンス ("カテゴリ/明細名#番号")
        #[arg(required = true)]
        id: InstanceId,

        /// 数量
        #[arg(short, long)]
        qty: Option<String>,

        /// 単価
        #[arg(short, long)]
        price: Option<String>,

        /// 場所
        #[arg(short, long)]
        location: Option<String>,

        /// 備考
        #[arg(short, long)]
        info: Option<String>,

        /// 同時承認キー（空文字で解除）
        #[arg(short, long)]
        key: Option<String>,

        /// 写真ファイル
        #[arg(long, conflicts_with = "no_photo")]
        photo: Option<PathBuf>,

        /// 写真を外す
        #[arg(long)]
        no_photo: bool,

        /// 見積文を手修正（テンプレートの代わりに使う）
        #[arg(long, conflicts_with = "reset_text")]
        text: Option<String>,

        /// 手修正した見積文を破棄
        #[arg(long)]
        reset_text: bool,

        /// 選択する
        #[arg(long, conflicts_with = "deselect")]
        select: bool,

        /// 選択を外す
        #[arg(long)]
        deselect: bool,
    },

    /// 明細の選択を切り替え
    Toggle {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// インスタンス（複数可）
        #[arg(required = true, num_args = 1..)]
        ids: Vec<InstanceId>,
    },

    /// 明細1件の見積文をプレビュー
    Preview {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// インスタンス ("カテゴリ/明細名#番号")
        #[arg(required = true)]
        id: InstanceId,
    },

    /// 選択済み明細から見積書を組み立てて表示
    Generate {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,
    },

    /// 見積書をファイルに出力
    Export {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// 出力形式 (text/excel/both)
        #[arg(short, long, default_value = "both")]
        format: ExportFormat,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 保存済みの作業指示一覧
    List {
        /// 作業指示番号で検索
        #[arg(short, long)]
        search: Option<String>,
    },

    /// 保存データを削除
    Delete {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// 確認せずに削除
        #[arg(short, long)]
        yes: bool,
    },

    /// 保存データを別の場所へコピー
    CopyOut {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// コピー先ファイル/ディレクトリ
        #[arg(required = true)]
        dest: PathBuf,
    },

    /// 入力値をすべてリセット（インスタンスと写真は残す）
    Clear {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,
    },

    /// 対話的に明細を入力
    Fill {
        /// 作業指示番号
        #[arg(required = true)]
        work_order: String,

        /// カテゴリで絞り込み
        #[arg(short, long)]
        category: Option<String>,

        /// 選択済みの明細のみ
        #[arg(long)]
        selected: bool,
    },

    /// 現場見積（草刈り・屋根）
    Estimate {
        #[command(subcommand)]
        kind: EstimateKind,

        /// 価格表の読み込み元（CSVファイルまたはURL）
        #[arg(long, global = true)]
        pricing: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// カタログURLを設定（空文字で解除）
        #[arg(long)]
        set_catalog_url: Option<String>,

        /// 価格表URLを設定（空文字で解除）
        #[arg(long)]
        set_pricing_url: Option<String>,

        /// 会社名を設定
        #[arg(long)]
        set_company: Option<String>,

        /// 保存先ディレクトリを設定
        #[arg(long)]
        set_data_dir: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum EstimateKind {
    /// 草刈り
    Grass {
        /// 草丈 (inch)
        #[arg(long, required = true)]
        height: String,

        /// 管理面積 (SF)
        #[arg(long, required = true)]
        lot: String,

        /// 敷地面積 (SF)
        #[arg(long, default_value = "0")]
        total_lot: String,

        /// 注記
        #[arg(long, default_value = "")]
        disclaimer: String,
    },

    /// 屋根（葺き替え・養生）
    Roof {
        /// 屋根面積 (SF)
        #[arg(long, required = true)]
        area: f64,

        /// 水切り (LF)
        #[arg(long, default_value = "0")]
        edge_metal: f64,

        /// 棟包み (LF)
        #[arg(long, default_value = "0")]
        ridge_cap: f64,

        /// ルーフジャック (EA)
        #[arg(long, default_value = "0")]
        roof_jack: f64,

        /// 階数 (1/2)
        #[arg(long, default_value = "1")]
        storey: u32,

        /// 顧客区分 (Flat Fee/SLFS/SCFS)
        #[arg(long, default_value = "Flat Fee")]
        client: Client,
    },
}
