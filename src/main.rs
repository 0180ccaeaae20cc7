use anyhow::Context;
use bid_writer::{catalog_source, cli, config, error, export, fill, logging, session, store};
use bid_writer_common::{
    format_money, preview, CatalogItem, GrassInput, InstanceUpdate, ItemInstance, ProposalHeader, RoofInput,
};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands, EstimateKind};
use config::Config;
use dialoguer::Confirm;
use error::{BidWriterError, Result};
use session::Session;
use std::collections::BTreeSet;
use store::StateStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let config = Config::load().context("設定ファイルを読み込めません")?;

    match cli.command {
        Commands::Catalog { search, templates } => {
            let loaded = catalog_source::load_catalog(&config, cli.catalog.as_deref(), cli.offline).await;
            println!("📚 カタログ: {} 件 ({})\n", loaded.catalog.len(), loaded.origin);

            let items: Vec<&CatalogItem> = match search.as_deref() {
                Some(term) => loaded.catalog.search(term),
                None => loaded.catalog.items().collect(),
            };
            print_catalog_items(&items, templates);
        }

        Commands::New { work_order, force } => {
            let loaded = catalog_source::load_catalog(&config, cli.catalog.as_deref(), cli.offline).await;
            let store = StateStore::from_config(&config)?;

            let work_order = match work_order {
                Some(wo) => wo,
                None => store::autosave_name(&config.autosave_prefix, Local::now().timestamp()),
            };
            let session = Session::create(&store, &loaded.catalog, &work_order, force)?;
            let path = session.save(&store)?;
            println!("✔ 見積シートを作成: WO# {} ({}明細)", session.work_order, session.sheet.len());
            println!("  保存先: {}", path.display());
        }

        Commands::Show { work_order, category, search } => {
            let (_, session) = open_session(&config, &cli.catalog, cli.offline, &work_order).await?;

            let matched: Option<BTreeSet<_>> = search
                .as_deref()
                .map(|term| session.sheet.search(term).into_iter().cloned().collect());

            println!("📋 WO# {}  (選択 {}/{})\n", session.work_order, session.sheet.selected_count(), session.sheet.len());
            let mut current_category = None;
            for inst in session.sheet.instances() {
                if let Some(c) = category.as_deref() {
                    if !inst.id.category.eq_ignore_ascii_case(c) {
                        continue;
                    }
                }
                if let Some(ids) = &matched {
                    if !ids.contains(&inst.id) {
                        continue;
                    }
                }
                if current_category != Some(inst.id.category.as_str()) {
                    println!("[{}]", inst.id.category);
                    current_category = Some(inst.id.category.as_str());
                }
                print_instance_line(inst);
            }
        }

        Commands::Add { work_order, item } => {
            let loaded = catalog_source::load_catalog(&config, cli.catalog.as_deref(), cli.offline).await;
            let store = StateStore::from_config(&config)?;
            let mut session = Session::open(&store, &loaded.catalog, &work_order)?;

            let id = session.sheet.add_instance(&loaded.catalog, &item.category, &item.item_name)?;
            session.save(&store)?;
            println!("✔ 追加: {}", id);
        }

        Commands::Remove { work_order, id } => {
            let (store, mut session) = open_session(&config, &cli.catalog, cli.offline, &work_order).await?;
            let removed = session.sheet.delete_instance(&id)?;
            session.save(&store)?;
            println!("✔ 削除: {}", removed.id);
        }

        Commands::Set {
            work_order,
            id,
            qty,
            price,
            location,
            info,
            key,
            photo,
            no_photo,
            text,
            reset_text,
            select,
            deselect,
        } => {
            let (store, mut session) = open_session(&config, &cli.catalog, cli.offline, &work_order).await?;

            let photo = match (photo, no_photo) {
                (Some(path), _) => {
                    if !path.is_file() {
                        return Err(BidWriterError::FileNotFound(path.display().to_string()).into());
                    }
                    Some(Some(path.canonicalize().unwrap_or(path)))
                }
                (None, true) => Some(None),
                (None, false) => None,
            };
            let custom_text = match (text, reset_text) {
                (Some(text), _) => Some(Some(text)),
                (None, true) => Some(None),
                (None, false) => None,
            };
            let selected = match (select, deselect) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            let update = InstanceUpdate {
                quantity: qty,
                unit_price: price,
                location,
                info,
                conjunction_key: key,
                selected,
                photo,
                custom_text,
            };
            if update.is_empty() {
                println!("変更する項目がありません（--qty, --price などを指定）");
                return Ok(());
            }

            session.sheet.update(&id, update)?;
            session.save(&store)?;
            if let Some(inst) = session.sheet.get(&id) {
                println!("✔ 更新: {}", id);
                print_instance_line(inst);
            }
        }

        Commands::Toggle { work_order, ids } => {
            let (store, mut session) = open_session(&config, &cli.catalog, cli.offline, &work_order).await?;
            for id in &ids {
                let selected = session.sheet.toggle(id)?;
                println!("✔ {} {}", if selected { "選択" } else { "選択解除" }, id);
            }
            session.save(&store)?;
        }

        Commands::Preview { work_order, id } => {
            let (_, session) = open_session(&config, &cli.catalog, cli.offline, &work_order).await?;
            println!("{}", preview(&session.sheet, &id)?);
        }

        Commands::Generate { work_order } => {
            let (_, session) = open_session(&config, &cli.catalog, cli.offline, &work_order).await?;
            let proposal = session.proposal()?;

            println!("📝 WO# {} 見積書\n", session.work_order);
            print!("{}", proposal.listing());
            println!("\n合計: ${}", format_money(proposal.grand_total));
            if proposal.is_multi_category() {
                let summary: Vec<String> = proposal
                    .category_summary()
                    .into_iter()
                    .map(|(category, count)| format!("{} {}件", category, count))
                    .collect();
                println!("カテゴリ: {}", summary.join(", "));
            }
        }

        Commands::Export { work_order, format, output } => {
            println!("📄 bid-writer - 見積書出力\n");
            let (_, session) = open_session(&config, &cli.catalog, cli.offline, &work_order).await?;
            let proposal = session.proposal()?;
            println!("✔ {}件の見積を組み立て（合計 ${}）\n", proposal.len(), format_money(proposal.grand_total));

            let now = Local::now();
            let header = ProposalHeader {
                company: config.company_name.clone(),
                work_order: Some(session.work_order.clone()),
                date: export::display_date(&now),
            };
            let stem = export::default_file_stem(&config.company_name, &now);
            let output_dir = output.unwrap_or_else(|| std::path::PathBuf::from("."));

            export::export_proposal(&proposal, &header, format, &output_dir, &stem)
                .with_context(|| format!("{} への出力に失敗しました", output_dir.display()))?;

            println!("\n✅ 出力完了");
        }

        Commands::List { search } => {
            let store = StateStore::from_config(&config)?;
            let entries = store.list(search.as_deref())?;
            if entries.is_empty() {
                println!("保存データがありません: {}", store.dir().display());
                return Ok(());
            }

            println!("保存データ ({}件):", entries.len());
            for entry in entries {
                println!(
                    "  WO# {:<20} 選択 {:>3}/{:<3}  {}",
                    entry.work_order,
                    entry.selected_count,
                    entry.bid_count,
                    entry.modified.format("%Y-%m-%d %H:%M")
                );
            }
        }

        Commands::Delete { work_order, yes } => {
            let store = StateStore::from_config(&config)?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("WO# {} の保存データを削除しますか？", work_order))
                    .default(false)
                    .interact()
                    .map_err(|e| BidWriterError::CliExecution(e.to_string()))?;

            if confirmed {
                store.delete(&work_order)?;
                println!("✔ 削除しました: WO# {}", work_order);
            } else {
                println!("キャンセルしました");
            }
        }

        Commands::CopyOut { work_order, dest } => {
            let store = StateStore::from_config(&config)?;
            let target = store.export_to(&work_order, &dest)?;
            println!("✔ コピーしました: {}", target.display());
        }

        Commands::Clear { work_order } => {
            let loaded = catalog_source::load_catalog(&config, cli.catalog.as_deref(), cli.offline).await;
            let store = StateStore::from_config(&config)?;
            let mut session = Session::open(&store, &loaded.catalog, &work_order)?;

            session.sheet.clear(&loaded.catalog);
            session.save(&store)?;
            println!("✔ WO# {} の入力をリセットしました", session.work_order);
        }

        Commands::Fill { work_order, category, selected } => {
            println!("📝 bid-writer - 明細入力\n");
            let (store, mut session) = open_session(&config, &cli.catalog, cli.offline, &work_order).await?;

            let updated = fill::run_interactive_fill(&mut session, category.as_deref(), selected)?;
            let path = session.save(&store)?;
            println!("✔ {}件を更新して保存: {}", updated, path.display());
        }

        Commands::Estimate { kind, pricing } => {
            let tables = catalog_source::load_pricing(&config, pricing.as_deref(), cli.offline).await;

            match kind {
                EstimateKind::Grass { height, lot, total_lot, disclaimer } => {
                    let estimate = tables.estimate_grass(&GrassInput {
                        grass_height: height,
                        maintainable_lot: lot,
                        total_lot,
                        disclaimer,
                    })?;
                    println!("🌱 草刈り見積 ({})  ${}\n", estimate.tier, format_money(estimate.price));
                    println!("{}", estimate.text);
                }
                EstimateKind::Roof { area, edge_metal, ridge_cap, roof_jack, storey, client } => {
                    let estimate = tables.estimate_roof(&RoofInput {
                        roof_area: area,
                        edge_metal,
                        ridge_cap,
                        roof_jack,
                        storey,
                        client,
                    })?;
                    println!(
                        "🏠 屋根見積 ({}階, {})  葺き替え ${} / 養生 ${}\n",
                        storey,
                        client,
                        format_money(estimate.replace_price),
                        format_money(estimate.tarp_price)
                    );
                    println!("{}", estimate.text());
                }
            }
        }

        Commands::Config { set_catalog_url, set_pricing_url, set_company, set_data_dir, show } => {
            let mut config = config;

            if let Some(url) = set_catalog_url {
                config.set_catalog_url(url)?;
                println!("✔ カタログURLを設定しました");
            }
            if let Some(url) = set_pricing_url {
                config.set_pricing_url(url)?;
                println!("✔ 価格表URLを設定しました");
            }
            if let Some(name) = set_company {
                config.set_company_name(name)?;
                println!("✔ 会社名を設定しました");
            }
            if let Some(dir) = set_data_dir {
                config.set_data_dir(dir)?;
                println!("✔ 保存先を設定しました");
            }

            if show {
                println!("設定:");
                println!("  会社名: {}", config.company_name);
                println!("  カタログURL: {}", config.catalog_url().unwrap_or_else(|| "未設定".into()));
                println!(
                    "  価格表URL: {}",
                    config.pricing_url.clone().unwrap_or_else(|| "未設定".into())
                );
                println!("  保存先: {}", config.data_dir()?.display());
                println!("  通信タイムアウト: {}秒", config.request_timeout_seconds);
            }
        }
    }

    Ok(())
}

/// カタログを読み込んで保存データを開く
async fn open_session(
    config: &Config,
    catalog: &Option<String>,
    offline: bool,
    work_order: &str,
) -> Result<(StateStore, Session)> {
    let loaded = catalog_source::load_catalog(config, catalog.as_deref(), offline).await;
    let store = StateStore::from_config(config)?;
    let session = Session::open(&store, &loaded.catalog, work_order)?;
    Ok((store, session))
}

fn print_catalog_items(items: &[&CatalogItem], templates: bool) {
    if items.is_empty() {
        println!("該当する明細がありません");
        return;
    }
    let mut current_category = None;
    for item in items {
        if current_category != Some(item.category.as_str()) {
            println!("[{}]", item.category);
            current_category = Some(item.category.as_str());
        }
        println!("  {:<40} ${}", item.item_name, item.unit_price);
        if templates {
            println!("    {}", item.template.replace('\n', "\n    "));
        }
    }
}

fn print_instance_line(inst: &ItemInstance) {
    let mark = if inst.selected { "[x]" } else { "[ ]" };
    let mut line = format!(
        "  {} {:<36} 数量 {} × ${} = ${}",
        mark,
        inst.id.display_name(),
        inst.vars().quantity,
        inst.unit_price,
        format_money(inst.total())
    );
    if let Some(key) = inst.conjunction() {
        line.push_str(&format!("  [{}]", key));
    }
    if inst.photo.is_some() {
        line.push_str("  📷");
    }
    println!("{}", line);
}
