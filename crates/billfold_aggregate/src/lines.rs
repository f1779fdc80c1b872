//! Invoice line-item decomposition.

use billfold_core::{Product, RawRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Maps each line of an invoice to its product.
///
/// Lines are read from `lines.data`. Each contributes
/// `{type, amount, description}` under the id found at `price.product`,
/// which may be a plain id or an expanded product object. Lines with no
/// product, type or amount are skipped. When two lines share a product the
/// later one wins.
///
/// # Examples
///
/// ```
/// use billfold_aggregate::parse_invoice_lines;
/// use billfold_core::RawRecord;
/// use serde_json::json;
///
/// let invoice = RawRecord::try_from(json!({
///     "object": "invoice",
///     "lines": {"data": [{
///         "price": {"product": "prod_1"},
///         "type": "invoiceitem",
///         "amount": 500,
///         "description": "Widget"
///     }]}
/// }))
/// .unwrap();
///
/// let products = parse_invoice_lines(&invoice);
/// assert_eq!(*products["prod_1"].amount(), 500);
/// ```
pub fn parse_invoice_lines(invoice: &RawRecord) -> BTreeMap<String, Product> {
    let Some(lines) = invoice
        .get("lines")
        .and_then(|lines| lines.get("data"))
        .and_then(Value::as_array)
    else {
        debug!(invoice = ?invoice.id(), "Invoice has no line items");
        return BTreeMap::new();
    };

    lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let parsed = parse_line(line);
            if parsed.is_none() {
                debug!(invoice = ?invoice.id(), line = index, "Skipping incomplete invoice line");
            }
            parsed
        })
        .collect()
}

fn parse_line(line: &Value) -> Option<(String, Product)> {
    let product = match line.get("price")?.get("product")? {
        Value::String(id) => id.clone(),
        Value::Object(expanded) => expanded.get("id")?.as_str()?.to_string(),
        _ => return None,
    };
    let kind = line.get("type")?.as_str()?;
    let amount = line.get("amount")?.as_i64()?;
    let description = line
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some((product, Product::new(kind, amount, description)))
}
