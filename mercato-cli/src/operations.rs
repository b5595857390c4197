use std::collections::BTreeMap;
use std::fmt::Write;

use mercato_common::{Order, Product};
use mercato_ledger::{Marketplace, ReportRow};

use crate::cli::{CartAction, Commands, Credentials, Range, ReportKind};

type CliResult = Result<String, Box<dyn std::error::Error>>;

/// Runs one command and returns what should be printed.
pub fn run(market: &mut Marketplace, command: Commands) -> CliResult {
    match command {
        Commands::Register { username, password, role } => {
            let id = market.register_user(&username, &password, role.into())?;
            Ok(format!("Registered '{}' with id {}", username, id))
        }
        Commands::Products => Ok(product_table(market.browse_products().iter())),
        Commands::Search { query } => {
            let found = market.search_products(&query);
            if found.is_empty() {
                return Ok(format!("No products match '{}'", query));
            }
            Ok(product_table(found.into_iter()))
        }
        Commands::AddProduct { auth, name, price, category, stock } => {
            let seller = login(market, &auth)?;
            let id = market.add_product(seller, &name, price, &category, stock)?;
            Ok(format!("Listed product {} '{}'", id, name))
        }
        Commands::Restock { auth, product, quantity } => {
            let seller = login(market, &auth)?;
            market.restock(seller, product, quantity)?;
            Ok(format!("Product {} restocked by {}", product, quantity))
        }
        Commands::Cart { auth, action } => {
            login(market, &auth)?;
            let out = match action {
                CartAction::Add { product, quantity } => {
                    market.add_to_cart(product, quantity)?;
                    format!("Added {} x product {}", quantity, product)
                }
                CartAction::Remove { product } => {
                    market.remove_from_cart(product)?;
                    format!("Removed product {}", product)
                }
                CartAction::Clear => {
                    market.clear_cart()?;
                    "Cart cleared".to_string()
                }
                CartAction::Show => cart_table(market)?,
            };
            market.logout()?;
            Ok(out)
        }
        Commands::Order { auth } => {
            login(market, &auth)?;
            let id = market.place_order()?;
            let total = market.order(id).map_or(0.0, Order::total);
            market.logout()?;
            Ok(format!("Order #{} placed, total ${:.2}", id, total))
        }
        Commands::Orders { auth } => {
            let user = login(market, &auth)?;
            Ok(order_table(market, user))
        }
        Commands::Expense { auth, amount, description } => {
            let seller = login(market, &auth)?;
            let id = market.record_expense(seller, amount, &description)?;
            Ok(format!("Expense recorded as transaction {}", id))
        }
        Commands::Refund { auth, order } => {
            let admin = login(market, &auth)?;
            market.process_refund(admin, order)?;
            Ok(format!("Order #{} refunded", order))
        }
        Commands::Report { auth, kind } => {
            let user = login(market, &auth)?;
            report(market, user, kind)
        }
    }
}

fn login(market: &mut Marketplace, auth: &Credentials) -> Result<u32, Box<dyn std::error::Error>> {
    Ok(market.login(&auth.user, &auth.password)?)
}

fn product_table<'a>(products: impl Iterator<Item = &'a Product>) -> String {
    let mut out = format!(
        "{:<4} {:<24} {:>10} {:<14} {:>6} {:>6}\n",
        "ID", "NAME", "PRICE", "CATEGORY", "STOCK", "SELLER"
    );
    for p in products {
        let _ = writeln!(
            out,
            "{:<4} {:<24} {:>10.2} {:<14} {:>6} {:>6}",
            p.id,
            p.name,
            p.price(),
            p.category,
            p.stock(),
            p.seller_id
        );
    }
    out
}

fn cart_table(market: &Marketplace) -> CliResult {
    let cart = market.cart()?;
    if cart.is_empty() {
        return Ok("Your cart is empty".to_string());
    }
    let mut out = String::new();
    for line in cart.lines() {
        match market.product(line.product_id) {
            Some(p) => {
                let _ = writeln!(
                    out,
                    "{:<4} {:<24} x{:<4} ${:.2}",
                    p.id,
                    p.name,
                    line.quantity,
                    p.price() * f64::from(line.quantity)
                );
            }
            None => {
                let _ = writeln!(out, "{:<4} (no longer listed) x{}", line.product_id, line.quantity);
            }
        }
    }
    let _ = write!(out, "Total: ${:.2}", market.cart_total()?);
    Ok(out)
}

fn order_table(market: &Marketplace, user: u32) -> String {
    let orders = market.orders_for(user);
    if orders.is_empty() {
        return "No orders yet".to_string();
    }
    let mut out = String::new();
    for order in orders {
        let _ = writeln!(
            out,
            "#{:<4} {} {:<9} ${:.2} ({} lines)",
            order.id,
            order.timestamp,
            order.status().as_str(),
            order.total(),
            order.items.len()
        );
    }
    out
}

fn rows_table(rows: &[ReportRow]) -> String {
    let mut out = format!("{:<10} | {:<8} | {:<9} | {}\n", "DATE", "TYPE", "AMOUNT", "DESCRIPTION");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<10} | {:<8} | ${:<8.2} | {}",
            row.date, row.label, row.amount, row.description
        );
    }
    out
}

fn buckets_table(title: &str, buckets: &BTreeMap<String, f64>) -> String {
    let mut out = format!("{}\n", title);
    for (key, amount) in buckets {
        let _ = writeln!(out, "{:<10} ${:.2}", key, amount);
    }
    out
}

fn report(market: &Marketplace, user: u32, kind: ReportKind) -> CliResult {
    let mut out = String::new();
    match kind {
        ReportKind::Seller { range, detailed, daily } => {
            let mut view = market.seller_view(user)?;
            if let Range { from: Some(from), to: Some(to) } = &range {
                view = view.between(from, to);
            }
            let s = view.summary();
            let _ = writeln!(out, "Total revenue:  ${:.2}", s.total_revenue);
            let _ = writeln!(out, "Total expenses: ${:.2}", s.total_expenses);
            let _ = writeln!(out, "Total refunds:  ${:.2}", s.total_refunds);
            let _ = writeln!(out, "Net profit:     ${:.2}", s.net_profit);
            if detailed {
                out.push_str(&rows_table(&view.report_rows()));
            }
            if daily {
                out.push_str(&buckets_table("Daily summary", &view.daily_summary()));
            }
        }
        ReportKind::Customer { range, detailed, monthly } => {
            let mut view = market.customer_view(user)?;
            if let Range { from: Some(from), to: Some(to) } = &range {
                view = view.between(from, to);
            }
            let s = view.summary();
            let _ = writeln!(out, "Total spent:    ${:.2}", s.total_spent);
            let _ = writeln!(out, "Total refunded: ${:.2}", s.total_refunded);
            let _ = writeln!(out, "Net spent:      ${:.2}", s.net_spent);
            if detailed {
                out.push_str(&rows_table(&view.report_rows()));
            }
            if monthly {
                out.push_str(&buckets_table("Monthly summary", &view.monthly_summary()));
            }
        }
    }
    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, RoleArg};
    use clap::Parser;
    use mercato_common::auth::Argon2Scheme;
    use mercato_common::utils::time::FixedClock;
    use mercato_ledger::LedgerConfig;
    use tempfile::tempdir;

    fn exec(market: &mut Marketplace, args: &[&str]) -> String {
        let mut argv = vec!["mercato"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        run(market, cli.command).unwrap()
    }

    #[test]
    fn test_commands_end_to_end() {
        let dir = tempdir().unwrap();
        let mut market = Marketplace::open_with(
            LedgerConfig::with_data_dir(dir.path()),
            Box::new(FixedClock::new("2024-03-01 12:00:00")),
            Box::new(Argon2Scheme::fast()),
        )
        .unwrap();

        exec(&mut market, &["register", "sam", "--password", "pw", "--role", "seller"]);
        exec(&mut market, &["register", "cleo", "--password", "pw"]);
        let listed = exec(
            &mut market,
            &["add-product", "--user", "sam", "--password", "pw", "--name", "Kettle", "--price", "30", "--category", "Kitchen", "--stock", "4"],
        );
        assert_eq!(listed, "Listed product 1 'Kettle'");

        assert!(exec(&mut market, &["search", "kettle"]).contains("Kettle"));
        exec(&mut market, &["cart", "--user", "cleo", "--password", "pw", "add", "1", "2"]);
        let placed = exec(&mut market, &["order", "--user", "cleo", "--password", "pw"]);
        assert_eq!(placed, "Order #1 placed, total $60.00");

        let report = exec(&mut market, &["report", "--user", "sam", "--password", "pw", "seller", "--daily"]);
        assert!(report.contains("Total revenue:  $60.00"));
        assert!(report.contains("2024-03-01 $60.00"));

        let spending = exec(
            &mut market,
            &["report", "--user", "cleo", "--password", "pw", "customer", "--detailed"],
        );
        assert!(spending.contains("PURCHASE"));
    }

    #[test]
    fn test_role_arg_maps_to_role() {
        assert_eq!(mercato_common::Role::from(RoleArg::Seller), mercato_common::Role::Seller);
    }

    #[test]
    fn test_range_needs_both_ends() {
        let parsed = Cli::try_parse_from([
            "mercato", "report", "--user", "a", "--password", "b", "seller", "--from", "2024-01-01",
        ]);
        assert!(parsed.is_err());
    }
}
