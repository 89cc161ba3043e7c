use std::{
    error::Error,
    io::{self},
    path::Path,
    process::exit,
};

use clap::Parser;
use rusqlite::Connection;

use mywallet::{
    PasswordHash, ValidatedPassword,
    user::{User, get_user_by_email, parse_email, update_password},
};

/// A utility for changing the password of a registered user without the
/// password reset email.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address the user logs in with.
    #[arg(long)]
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let conn = Connection::open(db_path)?;
    let user = get_user(&args.email, &conn);
    println!("Resetting password for {}", user.email);

    let password_hash = match get_new_password_hash() {
        Some(password_hash) => password_hash,
        None => return Ok(()),
    };
    update_password(user.id, &password_hash, &conn)?;

    println!("Password updated successfully!");

    Ok(())
}

fn get_user(raw_email: &str, conn: &Connection) -> User {
    let email = match parse_email(raw_email) {
        Ok(email) => email,
        Err(error) => {
            print_error(error);
            exit(1);
        }
    };

    match get_user_by_email(&email, conn) {
        Ok(user) => user,
        Err(error) => {
            print_error(format!("Could not find the user {email}: {error}"));
            exit(1);
        }
    }
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }
}

fn get_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a new password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        let validated_password = match ValidatedPassword::new(&first_password) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
            }
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}
