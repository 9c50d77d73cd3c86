//! Sales fact builder.
//!
//! Flattens the seven raw tables into one row per order detail line:
//!
//! 1. decode every table against its column contract (fail fast);
//! 2. compute `Revenue` per detail line;
//! 3. left-join products, categories, suppliers, orders, customers and
//!    employees, in that order, each keyed on a column the earlier joins
//!    brought in;
//! 4. coerce order dates, enrich the customer country with region and ISO3;
//! 5. project into [`SalesFactLine`]s.
//!
//! Left joins never drop a detail line. With [`KeyPolicy::Validate`] they
//! never duplicate one either, so the output has exactly as many rows as
//! `order_details`, in the same order.

mod join;
mod report;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sales_extract::TableKind;
use tracing::{info, warn};

pub use join::{KeyIndex, KeyPolicy, left_join};
pub use report::DataQualityReport;

use crate::dates::{self, Coerced};
use crate::error::EtlError;
use crate::geo;
use crate::models::fact::{SalesFactLine, line_revenue};
use crate::models::raw::{
    Category, Customer, Employee, Order, OrderDetail, Product, RawTables, Supplier,
};
use crate::schema::decode;

/// Output of [`build_sales_facts`].
#[derive(Debug, Clone, PartialEq)]
pub struct SalesFacts {
    /// The fact table, in `order_details` order.
    pub lines: Vec<SalesFactLine>,
    /// What went wrong without failing the build.
    pub report: DataQualityReport,
}

/// An order with its dates already coerced.
#[derive(Debug)]
struct DatedOrder<'a> {
    order: &'a Order,
    order_date: Option<NaiveDateTime>,
    shipped_date: Option<NaiveDateTime>,
}

/// One detail line while the joins accumulate its dimensions.
#[derive(Debug, Clone)]
struct Partial<'a> {
    detail: &'a OrderDetail,
    revenue: Decimal,
    product: Option<&'a Product>,
    category: Option<&'a Category>,
    supplier: Option<&'a Supplier>,
    order: Option<&'a DatedOrder<'a>>,
    customer: Option<&'a Customer>,
    employee: Option<&'a Employee>,
}

/// Build the sales fact table from one raw snapshot.
///
/// # Errors
///
/// * [`EtlError::SchemaMismatch`] / [`EtlError::InvalidValue`] when a table
///   breaks its column contract.
/// * [`EtlError::DuplicateKey`] under [`KeyPolicy::Validate`] when a
///   right-hand table repeats a key.
/// * [`EtlError::Overflow`] when a line's revenue leaves the decimal range.
pub fn build_sales_facts(raw: &RawTables, policy: KeyPolicy) -> Result<SalesFacts, EtlError> {
    let details: Vec<OrderDetail> = decode(&raw.order_details)?;
    let products: Vec<Product> = decode(&raw.products)?;
    let categories: Vec<Category> = decode(&raw.categories)?;
    let suppliers: Vec<Supplier> = decode(&raw.suppliers)?;
    let orders: Vec<Order> = decode(&raw.orders)?;
    let customers: Vec<Customer> = decode(&raw.customers)?;
    let employees: Vec<Employee> = decode(&raw.employees)?;

    let mut report = DataQualityReport::default();
    let dated = coerce_order_dates(&orders, &mut report);

    let by_product = KeyIndex::build(TableKind::Products, &products, |p| p.product_id, policy)?;
    let by_category =
        KeyIndex::build(TableKind::Categories, &categories, |c| c.category_id, policy)?;
    let by_supplier =
        KeyIndex::build(TableKind::Suppliers, &suppliers, |s| s.supplier_id, policy)?;
    let by_order = KeyIndex::build(TableKind::Orders, &dated, |o| o.order.order_id, policy)?;
    let by_customer = KeyIndex::build(
        TableKind::Customers,
        &customers,
        |c| c.customer_id.clone(),
        policy,
    )?;
    let by_employee =
        KeyIndex::build(TableKind::Employees, &employees, |e| e.employee_id, policy)?;

    // revenue first, on fresh rows; the decoded details stay untouched
    let rows = details
        .iter()
        .enumerate()
        .map(|(row, detail)| {
            let revenue = line_revenue(detail.unit_price, detail.quantity, detail.discount)
                .ok_or(EtlError::Overflow {
                    table: TableKind::OrderDetails,
                    row,
                    field: "Revenue",
                })?;
            Ok(Partial {
                detail,
                revenue,
                product: None,
                category: None,
                supplier: None,
                order: None,
                customer: None,
                employee: None,
            })
        })
        .collect::<Result<Vec<Partial<'_>>, EtlError>>()?;

    let (rows, n) = left_join(rows, &by_product, |r| Some(r.detail.product_id), |r, p| {
        r.product = Some(p)
    });
    report.unmatched_products = n;

    let (rows, n) = left_join(
        rows,
        &by_category,
        |r| r.product.and_then(|p| p.category_id),
        |r, c| r.category = Some(c),
    );
    report.unmatched_categories = n;

    let (rows, n) = left_join(
        rows,
        &by_supplier,
        |r| r.product.and_then(|p| p.supplier_id),
        |r, s| r.supplier = Some(s),
    );
    report.unmatched_suppliers = n;

    let (rows, n) = left_join(rows, &by_order, |r| Some(r.detail.order_id), |r, o| {
        r.order = Some(o)
    });
    report.unmatched_orders = n;

    let (rows, n) = left_join(
        rows,
        &by_customer,
        |r| r.order.and_then(|o| o.order.customer_id.clone()),
        |r, c| r.customer = Some(c),
    );
    report.unmatched_customers = n;

    let (rows, n) = left_join(
        rows,
        &by_employee,
        |r| r.order.and_then(|o| o.order.employee_id),
        |r, e| r.employee = Some(e),
    );
    report.unmatched_employees = n;

    if rows.len() != details.len() {
        warn!(details = details.len(), lines = rows.len(), "joins fanned out detail lines");
    }

    let lines: Vec<SalesFactLine> = rows.iter().map(|r| project(r, &mut report)).collect();
    log_report(&report);
    info!(lines = lines.len(), "built sales fact table");

    Ok(SalesFacts { lines, report })
}

fn coerce_order_dates<'a>(orders: &'a [Order], report: &mut DataQualityReport) -> Vec<DatedOrder<'a>> {
    orders
        .iter()
        .map(|order| {
            let order_date = match dates::coerce(&order.order_date) {
                Coerced::Unparseable => {
                    report.unparseable_order_dates += 1;
                    warn!(order_id = order.order_id, raw = %order.order_date, "unparseable OrderDate");
                    None
                }
                c => c.value(),
            };
            let shipped_date = match dates::coerce(&order.shipped_date) {
                Coerced::Unparseable => {
                    report.unparseable_shipped_dates += 1;
                    warn!(order_id = order.order_id, raw = %order.shipped_date, "unparseable ShippedDate");
                    None
                }
                c => c.value(),
            };
            DatedOrder {
                order,
                order_date,
                shipped_date,
            }
        })
        .collect()
}

fn project(r: &Partial<'_>, report: &mut DataQualityReport) -> SalesFactLine {
    let country = r.customer.and_then(|c| c.country.clone());
    let (region, iso3) = match country.as_deref() {
        Some(name) => match geo::lookup(name) {
            Some(info) => (info.region, Some(info.iso3.to_string())),
            None => {
                report.unmapped_countries.insert(name.to_string());
                (geo::Region::Other, None)
            }
        },
        None => (geo::Region::Other, None),
    };
    if r.revenue < Decimal::ZERO {
        report.negative_revenue_lines += 1;
    }

    SalesFactLine {
        order_id: r.detail.order_id,
        order_date: r.order.and_then(|o| o.order_date),
        shipped_date: r.order.and_then(|o| o.shipped_date),
        customer_id: r.order.and_then(|o| o.order.customer_id.clone()),
        contact_name: r.customer.and_then(|c| c.contact_name.clone()),
        region,
        country,
        country_iso3: iso3,
        employee_id: r.order.and_then(|o| o.order.employee_id),
        employee_name: r.employee.and_then(Employee::full_name),
        product_id: r.detail.product_id,
        product_name: r.product.and_then(|p| p.product_name.clone()),
        category_id: r.product.and_then(|p| p.category_id),
        category_name: r.category.and_then(|c| c.category_name.clone()),
        supplier_id: r.product.and_then(|p| p.supplier_id),
        supplier_name: r.supplier.and_then(|s| s.company_name.clone()),
        unit_price: r.detail.unit_price,
        quantity: r.detail.quantity,
        discount: r.detail.discount,
        revenue: r.revenue,
    }
}

fn log_report(report: &DataQualityReport) {
    if report.negative_revenue_lines > 0 {
        warn!(lines = report.negative_revenue_lines, "negative revenue (discount above 1)");
    }
    for (table, n) in [
        (TableKind::Products, report.unmatched_products),
        (TableKind::Categories, report.unmatched_categories),
        (TableKind::Suppliers, report.unmatched_suppliers),
        (TableKind::Orders, report.unmatched_orders),
        (TableKind::Customers, report.unmatched_customers),
        (TableKind::Employees, report.unmatched_employees),
    ] {
        if n > 0 {
            warn!(%table, lines = n, "foreign keys without a match; dimensions left null");
        }
    }
    if !report.unmapped_countries.is_empty() {
        warn!(countries = ?report.unmapped_countries, "countries missing from the region/ISO3 maps");
    }
}
