//! Receipt

use std::io;

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{Alignment, Style, Theme, object::Columns},
};
use thiserror::Error;

use crate::{
    order::{OrderDraft, OrderLine, OrderReference},
    payment::PaymentMethod,
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable summary of a placed (or about to be placed) order.
#[derive(Debug, Clone)]
pub struct Receipt {
    reference: Option<OrderReference>,
    lines: SmallVec<[OrderLine; 8]>,
    payment_method: PaymentMethod,
    subtotal: Money<'static, Currency>,
    discount: Money<'static, Currency>,
    total: Money<'static, Currency>,
}

impl Receipt {
    /// Receipt for an order draft.
    pub fn from_draft(draft: &OrderDraft) -> Self {
        Self {
            reference: None,
            lines: draft.lines.clone(),
            payment_method: draft.payment_method,
            subtotal: draft.subtotal,
            discount: draft.discount,
            total: draft.total,
        }
    }

    /// Show the order reference in the header.
    #[must_use]
    pub fn with_reference(mut self, reference: OrderReference) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Order reference, once the order was recorded.
    pub fn reference(&self) -> Option<&OrderReference> {
        self.reference.as_ref()
    }

    /// Sum of line subtotals.
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Payment-method discount.
    pub fn discount(&self) -> Money<'static, Currency> {
        self.discount
    }

    /// Amount due.
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Writes the receipt as a table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if let Some(reference) = &self.reference {
            writeln!(out, "Order {reference}").map_err(|_err| ReceiptError::IO)?;
        }

        let mut builder = Builder::default();

        builder.push_record(["Qty", "Title", "Unit Price", "Subtotal"]);

        for line in &self.lines {
            builder.push_record([
                line.quantity.to_string(),
                line.title.clone(),
                line.unit_price.to_string(),
                line.subtotal.to_string(),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Columns::new(2..4), Alignment::right());
        table.modify(Columns::first(), Alignment::right());

        writeln!(out, "{table}").map_err(|_err| ReceiptError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let discount_label = format!("Discount ({}):", self.payment_method);

        let rows = [
            ("Subtotal:", self.subtotal.to_string()),
            (discount_label.as_str(), format!("-{}", self.discount)),
            ("Total:", self.total.to_string()),
        ];

        let label_width = rows.iter().map(|(label, _)| label.chars().count()).max();
        let value_width = rows.iter().map(|(_, value)| value.chars().count()).max();

        for (label, value) in &rows {
            if *label == discount_label && self.discount.to_minor_units() == 0 {
                continue;
            }

            writeln!(
                out,
                " {label:>label_width$}  {value:>value_width$}",
                label_width = label_width.unwrap_or_default(),
                value_width = value_width.unwrap_or_default(),
            )
            .map_err(|_err| ReceiptError::IO)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::BRL;
    use testresult::TestResult;

    use super::*;
    use crate::books::BookId;

    fn brl(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, BRL)
    }

    fn receipt(method: PaymentMethod, discount: i64) -> Receipt {
        Receipt {
            reference: None,
            lines: [OrderLine {
                book_id: BookId::new(),
                title: "Grande Sertão: Veredas".to_string(),
                quantity: 2,
                unit_price: brl(49_90),
                subtotal: brl(99_80),
            }]
            .into_iter()
            .collect(),
            payment_method: method,
            subtotal: brl(99_80),
            discount: brl(discount),
            total: brl(99_80 - discount),
        }
    }

    fn render(receipt: &Receipt) -> Result<String, Box<dyn std::error::Error>> {
        let mut out = Vec::new();

        receipt.write_to(&mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn write_to_renders_lines_and_totals() -> TestResult {
        let output = render(&receipt(PaymentMethod::Pix, 4_99))?;

        assert!(output.contains("Grande Sertão: Veredas"), "missing title:\n{output}");
        assert!(output.contains("Discount (pix):"), "missing discount:\n{output}");
        assert!(
            output.contains(&brl(94_81).to_string()),
            "missing total:\n{output}"
        );

        Ok(())
    }

    #[test]
    fn zero_discount_is_not_shown() -> TestResult {
        let output = render(&receipt(PaymentMethod::Boleto, 0))?;

        assert!(!output.contains("Discount"), "unexpected discount:\n{output}");
        assert!(output.contains("Total:"), "missing total:\n{output}");

        Ok(())
    }

    #[test]
    fn reference_heads_the_receipt() -> TestResult {
        let uuid: uuid::Uuid = "0192f4a1-7c3e-7b00-8000-00005e1b09c4".parse()?;
        let receipt = receipt(PaymentMethod::Pix, 4_99).with_reference(OrderReference::from(uuid));

        let output = render(&receipt)?;

        assert!(output.starts_with("Order #5E1B09C4"), "missing reference:\n{output}");

        Ok(())
    }
}
