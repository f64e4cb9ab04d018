//! Usage statistics.

use crate::render::{self, Output};
use chatvault_service::ChatVault;
use console::style;

/// Run the stats command.
pub async fn run(vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    let stats = vault.history().usage_stats(vault.owner()).await?;
    if out.is_json() {
        return render::print_json(&stats);
    }

    println!("{}", style("Totals").bold());
    println!("  Conversations: {}", stats.total_conversations);
    println!("  Messages:      {}", stats.total_messages);
    println!("  Tokens:        {}", stats.total_tokens);
    println!("  Cost:          {}", render::format_cost(stats.total_cost));

    if !stats.by_platform.is_empty() {
        println!("\n{}", style("By platform").bold());
        for row in &stats.by_platform {
            println!(
                "  {:<12} {:>5} conv  {:>9} tokens  {}",
                row.platform.display_name(),
                row.count,
                row.tokens,
                render::format_cost(row.cost)
            );
        }
    }

    if !stats.by_model.is_empty() {
        println!("\n{}", style("By model").bold());
        for row in &stats.by_model {
            println!(
                "  {:<28} {:>5} conv  {:>9} tokens  {}",
                row.model,
                row.count,
                row.tokens,
                render::format_cost(row.cost)
            );
        }
    }

    if !stats.monthly_usage.is_empty() {
        println!("\n{}", style("Monthly").bold());
        for row in &stats.monthly_usage {
            println!(
                "  {}-{:02}  {:>5} conv  {:>9} tokens  {}",
                row.year,
                row.month,
                row.conversations,
                row.tokens,
                render::format_cost(row.cost)
            );
        }
    }

    Ok(())
}
