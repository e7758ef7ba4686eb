//! Proportional sales-tax distribution.
//!
//! A composite sales tax is split into components, each with its own rate and
//! tax-payable account. The charged tax amount may be manually overridden, so
//! the distribution works from each component's theoretical share and gives
//! the final component the exact remainder. The distributed total therefore
//! always equals the charged amount despite rounding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{from_cents, round2, to_cents, AccountId, SalesTaxId};

use super::error::PostingError;

/// One component of a (possibly composite) sales tax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxComponent {
    /// The sales tax definition this component belongs to.
    pub sales_tax_id: SalesTaxId,
    /// Component name (e.g. "GST", "PST").
    pub name: String,
    /// Rate in percent (e.g. 7 for 7%).
    pub rate: Decimal,
    /// The tax-payable account this component posts to.
    pub account_id: Option<AccountId>,
}

/// The tax charged on a transaction, with its component breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// The actual tax amount charged (possibly a manual override of the
    /// calculated total).
    pub amount: Decimal,
    /// Components the amount is distributed across.
    pub components: Vec<TaxComponent>,
}

/// A component's distributed share of the charged tax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxShare {
    /// The sales tax definition.
    pub sales_tax_id: SalesTaxId,
    /// The tax-payable account to credit (sales) or debit (purchases).
    pub account_id: AccountId,
    /// The component's theoretical share from its rate.
    pub calculated: Decimal,
    /// The distributed amount.
    pub amount: Decimal,
}

/// Distributes the charged tax amount across components in proportion to
/// each component's theoretical share of `basis`.
///
/// All but the last component receive
/// `round2(calculated_i / total_calculated * tax_amount)`; the last component
/// receives the exact remainder, accumulated in integer cents.
///
/// # Errors
///
/// Returns `MissingTaxAccount` when a component lacks a target account, and
/// `ZeroTaxBasis` when tax was charged but every theoretical share is zero.
pub fn distribute_tax(
    basis: Decimal,
    tax: &TaxBreakdown,
) -> Result<Vec<TaxShare>, PostingError> {
    if tax.components.is_empty() || tax.amount == Decimal::ZERO {
        return Ok(vec![]);
    }

    let hundred = Decimal::ONE_HUNDRED;
    let calculated: Vec<Decimal> = tax
        .components
        .iter()
        .map(|c| round2(basis * c.rate / hundred))
        .collect();
    let total_calculated: Decimal = calculated.iter().copied().sum();

    if total_calculated == Decimal::ZERO {
        return Err(PostingError::ZeroTaxBasis { amount: tax.amount });
    }

    let total_cents = to_cents(tax.amount);
    let mut distributed_cents = 0i64;
    let mut shares = Vec::with_capacity(tax.components.len());

    for (index, component) in tax.components.iter().enumerate() {
        let account_id = component.account_id.ok_or_else(|| {
            PostingError::MissingTaxAccount {
                name: component.name.clone(),
            }
        })?;

        let cents = if index + 1 == tax.components.len() {
            // Exact remainder to the last component.
            total_cents - distributed_cents
        } else {
            to_cents(round2(calculated[index] / total_calculated * tax.amount))
        };
        distributed_cents += cents;

        shares.push(TaxShare {
            sales_tax_id: component.sales_tax_id,
            account_id,
            calculated: calculated[index],
            amount: from_cents(cents),
        });
    }

    Ok(shares)
}
