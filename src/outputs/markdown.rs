//! Markdown digest of recent announcements.
//!
//! The reporter reads the whole dataset, keeps the rows published inside a
//! trailing window of days, sorts them newest first and renders them as a
//! table inside a fixed README template. It is read-only with respect to the
//! dataset and the progress record.
//!
//! # Output
//!
//! ```text
//! # 巨潮资讯公告监控 (CninfoCrawler)
//!
//! > 自动提取近 7 天的关键词监控公告。更新时间：2024-01-07 09:30:00
//!
//! | 发布日期 | 代码 | 简称 | 关键字 | 公告标题 (点击跳转) |
//! | --- | --- | --- | --- | --- |
//! | 2024-01-07 | 000001 | 平安银行 | 警示 | [关于收到警示函的公告](http://...) |
//! ```

use chrono::{Days, NaiveDate, NaiveDateTime};
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::config::CrawlConfig;
use crate::models::Announcement;
use crate::outputs::dataset::{CsvDataset, Dataset};

const COLUMNS: [&str; 5] = ["发布日期", "代码", "简称", "关键字", "公告标题 (点击跳转)"];

/// Rows published within the last `window_days` days (today included),
/// newest first. Rows sharing a date keep their dataset order. A window
/// reaching past the earliest representable date keeps every row.
pub fn recent_rows(rows: &[Announcement], today: NaiveDate, window_days: i64) -> Vec<&Announcement> {
    let cutoff = today
        .checked_sub_days(Days::new(window_days.max(1).unsigned_abs() - 1))
        .unwrap_or(NaiveDate::MIN);
    let mut recent: Vec<&Announcement> = rows.iter().filter(|r| r.publish_date >= cutoff).collect();
    recent.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
    recent
}

/// Escape characters that would break a pipe-table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Title rendered as a Markdown link when the row has a document URL.
fn title_link(row: &Announcement) -> String {
    let title = cell(&row.title).replace('[', "\\[").replace(']', "\\]");
    match &row.document_url {
        Some(url) => format!("[{}]({})", title, url.replace(' ', "%20")),
        None => title,
    }
}

/// Render rows as a Markdown pipe table.
pub fn render_table(rows: &[&Announcement]) -> String {
    let mut md = String::new();
    writeln!(md, "| {} |", COLUMNS.join(" | ")).unwrap();
    writeln!(md, "|{}", " --- |".repeat(COLUMNS.len())).unwrap();
    for row in rows {
        writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            row.publish_date.format("%Y-%m-%d"),
            cell(row.stock_code.as_deref().unwrap_or_default()),
            cell(row.stock_name.as_deref().unwrap_or_default()),
            cell(&row.keyword),
            title_link(row)
        )
        .unwrap();
    }
    md
}

/// Embed the table of recent rows in the README template.
pub fn render_readme(
    rows: &[&Announcement],
    generated_at: NaiveDateTime,
    window_days: i64,
    dataset_name: &str,
) -> String {
    let mut md = String::new();
    writeln!(md, "# 巨潮资讯公告监控 (CninfoCrawler)\n").unwrap();
    writeln!(
        md,
        "> 自动提取近 {} 天的关键词监控公告。更新时间：{}\n",
        window_days,
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )
    .unwrap();
    md.push_str(&render_table(rows));
    writeln!(md, "\n---").unwrap();
    writeln!(md, "*更多历史数据请查看 [{0}](./{0})*", dataset_name).unwrap();
    md
}

/// Read the dataset and write the README digest.
///
/// Returns the number of rows included in the digest.
#[instrument(level = "info", skip_all, fields(dataset = %config.output_path.display(), readme = %config.readme_path.display()))]
pub async fn write_report(config: &CrawlConfig, now: NaiveDateTime) -> Result<usize, Box<dyn Error>> {
    let dataset = CsvDataset::new(&config.output_path);
    let rows = dataset.read_all().await?;
    let recent = recent_rows(&rows, now.date(), config.report_window_days);

    let dataset_name = dataset_link_name(dataset.path());
    let md = render_readme(&recent, now, config.report_window_days, &dataset_name);
    fs::write(&config.readme_path, md).await?;

    info!(total = rows.len(), recent = recent.len(), "Wrote announcement digest");
    Ok(recent.len())
}

fn dataset_link_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
