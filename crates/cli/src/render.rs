//! Server-side HTML for the explorer pages.

use alloy::primitives::{Address, B256};
use tx_explorer_classifier::{
    Classification, ClassificationFailure, EnrichedTransactionRecord, TransferDetails, TransferKind,
};

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `0x1234…abcd` form of a transaction hash.
pub fn short_hash(hash: &B256) -> String {
    let full = hash.to_string();
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

fn checksum(address: &Address) -> String {
    address.to_checksum(None)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>body{{font-family:sans-serif;margin:2em}}table{{border-collapse:collapse}}\
         td,th{{border:1px solid #ccc;padding:4px 8px;text-align:left}}img{{max-height:64px}}</style>\n\
         </head>\n<body>\n<nav><a href=\"/\">Home</a> | <a href=\"/erc20s\">ERC-20</a></nav>\n\
         <h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape(title),
        body = body,
    )
}

fn block_form(kind: TransferKind, latest_block: Option<u64>) -> String {
    let placeholder = latest_block
        .map(|n| n.to_string())
        .unwrap_or_else(|| "block number".to_string());
    format!(
        "<form action=\"/transactions/{kind}\" method=\"get\">\n\
         <input type=\"number\" name=\"block_num\" min=\"0\" placeholder=\"{placeholder}\" required>\n\
         <button type=\"submit\">Show {kind} transfers</button>\n</form>\n",
        kind = kind,
        placeholder = escape(&placeholder),
    )
}

fn latest_block_line(latest_block: Option<u64>) -> String {
    match latest_block {
        Some(n) => format!("<p>Latest block at startup: {}</p>\n", n),
        None => "<p>The node did not report a latest block at startup.</p>\n".to_string(),
    }
}

/// Landing page with lookup forms for both contracts.
pub fn index_page(latest_block: Option<u64>, nft: Address, erc20: Address) -> String {
    let mut body = latest_block_line(latest_block);
    body.push_str(&format!(
        "<h2>NFT collection</h2>\n<p><code>{}</code></p>\n{}",
        checksum(&nft),
        block_form(TransferKind::Nft, latest_block)
    ));
    body.push_str(&format!(
        "<h2>ERC-20 token</h2>\n<p><code>{}</code></p>\n{}",
        checksum(&erc20),
        block_form(TransferKind::Erc20, latest_block)
    ));
    layout("Transaction explorer", &body)
}

/// Landing page for ERC-20 lookups.
pub fn erc20_index_page(latest_block: Option<u64>, erc20: Address) -> String {
    let body = format!(
        "{}<p>Token contract <code>{}</code></p>\n{}",
        latest_block_line(latest_block),
        checksum(&erc20),
        block_form(TransferKind::Erc20, latest_block)
    );
    layout("ERC-20 transfers", &body)
}

/// Records and failures of one block for one contract.
pub fn transactions_page(
    kind: TransferKind,
    block: u64,
    contract: Address,
    classification: &Classification,
) -> String {
    let mut body = format!(
        "<p>Block {} | contract <code>{}</code> | {} transactions inspected</p>\n",
        block,
        checksum(&contract),
        classification.inspected
    );

    if classification.records.is_empty() {
        body.push_str("<p>No matching transactions.</p>\n");
    } else {
        body.push_str(&records_table(kind, &classification.records));
    }

    if !classification.failures.is_empty() {
        body.push_str(&failures_table(&classification.failures));
    }

    let title = match kind {
        TransferKind::Nft => format!("NFT transfers in block {}", block),
        TransferKind::Erc20 => format!("ERC-20 transfers in block {}", block),
    };
    layout(&title, &body)
}

fn records_table(kind: TransferKind, records: &[EnrichedTransactionRecord]) -> String {
    let mut table = String::from("<table>\n<tr><th>#</th><th>Transaction</th><th>From</th><th>Function</th>");
    match kind {
        TransferKind::Nft => table.push_str("<th>Token</th><th>Recipient</th><th>Image</th></tr>\n"),
        TransferKind::Erc20 => table.push_str("<th>Recipient</th><th>Amount</th></tr>\n"),
    }

    for record in records {
        table.push_str(&format!(
            "<tr><td>{}</td><td><a href=\"{}\">{}</a></td><td><code>{}</code></td><td>{}</td>",
            record.position,
            escape(&record.explorer_url),
            short_hash(&record.tx_hash),
            checksum(&record.from),
            escape(&record.function),
        ));
        match &record.details {
            TransferDetails::Nft(nft) => {
                table.push_str(&format!(
                    "<td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
                    nft.token_id,
                    checksum(&nft.recipient),
                    image_cell(&nft.image_url),
                ));
            }
            TransferDetails::Erc20(erc20) => {
                let assumed = if erc20.decimals_assumed {
                    " <small>(decimals assumed)</small>"
                } else {
                    ""
                };
                table.push_str(&format!(
                    "<td><code>{}</code></td><td>{} {}{}</td></tr>\n",
                    checksum(&erc20.recipient),
                    erc20.formatted_value,
                    escape(&erc20.symbol),
                    assumed,
                ));
            }
        }
    }

    table.push_str("</table>\n");
    table
}

// Only http(s) images are embedded; anything else is shown as text.
fn image_cell(url: &str) -> String {
    let escaped = escape(url);
    if url.starts_with("https://") || url.starts_with("http://") {
        format!("<a href=\"{0}\"><img src=\"{0}\" alt=\"token image\"></a>", escaped)
    } else {
        escaped
    }
}

fn failures_table(failures: &[ClassificationFailure]) -> String {
    let mut table = String::from(
        "<h2>Transactions that could not be classified</h2>\n<table>\n\
         <tr><th>#</th><th>Transaction</th><th>Stage</th><th>Error</th></tr>\n",
    );
    for failure in failures {
        table.push_str(&format!(
            "<tr><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
            failure.position,
            short_hash(&failure.tx_hash),
            failure.category,
            escape(&failure.error.to_string()),
        ));
    }
    table.push_str("</table>\n");
    table
}

/// Error page shown when a block cannot be loaded.
pub fn error_page(status: u16, message: &str) -> String {
    layout(
        &format!("Error {}", status),
        &format!("<p>{}</p>\n", escape(message)),
    )
}
