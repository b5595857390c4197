use std::env;
use std::fs;

use mercato_common::{Order, Product, Transaction, User};
use mercato_ledger::core::codec::{decode_stream, Record};
use mercato_ledger::core::store::cart::decode_cart;
use serde::Serialize;

fn dump<R: Record + Serialize>(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let (records, corruption) = decode_stream::<R>(bytes);
    if let Some(c) = corruption {
        eprintln!("⚠️ {}", c);
    }
    eprintln!("✅ Decoded {} {} records.", records.len(), R::KIND);
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let (Some(kind), Some(path)) = (args.get(1), args.get(2)) else {
        eprintln!("usage: inspect_store <product|user|order|transaction|cart> <path>");
        std::process::exit(2);
    };

    eprintln!("🔍 Inspecting {} file: {}", kind, path);
    let bytes = fs::read(path)?;

    match kind.as_str() {
        "product" | "products" => dump::<Product>(&bytes),
        "user" | "users" => dump::<User>(&bytes),
        "order" | "orders" => dump::<Order>(&bytes),
        "transaction" | "transactions" => dump::<Transaction>(&bytes),
        "cart" => {
            let (lines, corruption) = decode_cart(&bytes);
            if let Some(e) = corruption {
                eprintln!("⚠️ cart: {}", e);
            }
            println!("{}", serde_json::to_string_pretty(&lines)?);
            Ok(())
        }
        other => Err(format!("unknown kind '{}'", other).into()),
    }
}
