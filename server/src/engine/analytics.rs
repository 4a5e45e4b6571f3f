//! Read-only views over a registry snapshot for the inspection commands.

use std::collections::BTreeMap;

use super::pool::Pool;

/// Rows of the membership view: (pool, community, channel).
pub fn membership_rows(pools: &BTreeMap<String, Pool>) -> Vec<[String; 3]> {
    pools
        .iter()
        .flat_map(|(name, pool)| {
            pool.channels()
                .map(move |(guild, channel)| [name.clone(), guild.to_string(), channel.to_string()])
        })
        .collect()
}

/// Rows of the analytics view: (pool, community, messages relayed out).
pub fn analytics_rows(pools: &BTreeMap<String, Pool>) -> Vec<[String; 3]> {
    pools
        .iter()
        .flat_map(|(name, pool)| {
            pool.servers.iter().map(move |(guild, entry)| {
                [name.clone(), guild.clone(), entry.message_count.to_string()]
            })
        })
        .collect()
}

/// Render rows as an aligned monospace table with a dashed header rule.
pub fn render_table(headers: [&str; 3], rows: &[[String; 3]]) -> String {
    let mut widths = [headers[0].len(), headers[1].len(), headers[2].len()];
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    render_row(&mut out, &headers.map(str::to_string), &widths);
    render_row(
        &mut out,
        &widths.map(|w| "-".repeat(w)),
        &widths,
    );
    for row in rows {
        render_row(&mut out, row, &widths);
    }
    out
}

fn render_row(out: &mut String, cells: &[String; 3], widths: &[usize; 3]) {
    for (i, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        out.push_str(cell);
        if i < 2 {
            for _ in cell.chars().count()..(width + 2) {
                out.push(' ');
            }
        }
    }
    out.push('\n');
}
