use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use mywallet::{
    AddressForm, NewProfile, PasswordHash, ValidatedPassword, create_profile, initialize_db,
    ledger::{Ledger, Transaction, service::create_transaction},
    user::{create_user, parse_email},
};

/// A utility for creating a test database for the REST API server of mywallet.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user demo@example.com with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(&parse_email("demo@example.com")?, password_hash, &conn)?;
    create_profile(
        &NewProfile {
            user_id: user.id,
            first_name: "Demo".to_owned(),
            last_name: "User".to_owned(),
            birth_date: None,
            address: AddressForm {
                postcode: "01310-100".to_owned(),
                state_id: 25,
                neighbourhood: "Bela Vista".to_owned(),
                street: "Avenida Paulista".to_owned(),
                number: Some("1000".to_owned()),
                complement: None,
            },
        },
        &conn,
    )?;

    println!("Creating test transactions...");

    let today = OffsetDateTime::now_utc().date();
    let months_ago = |months: i64| -> Date { today - Duration::days(30 * months) };

    let expenses = [
        Transaction::build(user.id, 1500.0, months_ago(6), "Rent")
            .recurring(None)
            .category_id(Some(1)),
        Transaction::build(user.id, 89.9, months_ago(3), "Internet")
            .recurring(None)
            .category_id(Some(1)),
        Transaction::build(user.id, 120.0, months_ago(4), "Gym")
            .recurring(Some(today))
            .category_id(Some(6)),
        Transaction::build(user.id, 412.35, today, "Groceries").category_id(Some(2)),
        Transaction::build(user.id, 38.5, months_ago(1), "Bus card").category_id(Some(3)),
        Transaction::build(user.id, 250.0, today, "Dentist"),
    ];
    for terms in expenses {
        create_transaction(Ledger::Expense, user.id, terms, &conn)?;
    }

    let incomes = [
        Transaction::build(user.id, 5200.0, months_ago(6), "Salary").recurring(None),
        Transaction::build(user.id, 800.0, months_ago(2), "Freelance"),
    ];
    for terms in incomes {
        create_transaction(Ledger::Income, user.id, terms, &conn)?;
    }

    println!("Success!");

    Ok(())
}
