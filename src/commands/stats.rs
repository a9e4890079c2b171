use crate::commands::{Out, ReportRepoError};
use crate::repo::Budget;
use crate::stats::ChartSlice;
use crate::view::ListView;
use crate::Result;

/// Prints one line per chart slice: name, total, share and color.
pub async fn stats(budget: &Budget) -> Result<Out<Vec<ChartSlice>>> {
    let mut chart = ListView::chart(budget);
    chart.refresh().await.or_report("load statistics")?;
    let lines: Vec<String> = chart
        .items()
        .iter()
        .map(|s| format!("{:<20}  {:>12}  {:>6}%  {}", s.name, s.value, s.share, s.color))
        .collect();
    Ok(Out::new(lines.join("\n"), chart.items().to_vec()))
}
