//! Simple CLI for exercising the page cache.
//!
//! Usage:
//!   pool_cli <db_path> insert <page> <text>
//!   pool_cli <db_path> get <page> <index>
//!   pool_cli <db_path> dump <page>
//!   pool_cli <db_path> find <page> <key>
//!   pool_cli <db_path> delete <page> <index>
//!   pool_cli <db_path> compact <page>
//!   pool_cli <db_path> stats
//!   pool_cli <db_path> demo
//!
//! `--config <file.json>` may replace `<db_path>`. Logging is controlled by
//! `RUST_LOG` (default `info`).

use pagecache::{BufferPool, Config, Db, FilePageStore, PageId, PolicyKind, Result, SlottedPage};
use std::env;
use std::io::ErrorKind;
use std::path::Path;
use std::process::exit;

fn usage() -> ! {
    eprintln!("Usage: pool_cli <db_path | --config file.json> <command> [args...]");
    eprintln!("Commands:");
    eprintln!("  insert <page> <text>  - Append a record to a page");
    eprintln!("  get <page> <index>    - Print one record");
    eprintln!("  dump <page>           - Print every record and the free space");
    eprintln!("  find <page> <key>     - Find the first record starting with key");
    eprintln!("  delete <page> <index> - Delete a record");
    eprintln!("  compact <page>        - Rewrite a page's records contiguously");
    eprintln!("  stats                 - Show pool statistics");
    eprintln!("  demo                  - Run the eviction demo with every policy");
    exit(1);
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("ERROR: {}", e);
    exit(1);
}

fn parse_page(arg: Option<&String>) -> PageId {
    match arg.map(|s| s.parse::<u32>()) {
        Some(Ok(id)) => PageId::new(id),
        Some(Err(_)) => fail("invalid page index"),
        None => usage(),
    }
}

fn parse_index(arg: Option<&String>) -> usize {
    match arg.map(|s| s.parse::<usize>()) {
        Some(Ok(index)) => index,
        Some(Err(_)) => fail("invalid record index"),
        None => usage(),
    }
}

fn printable(record: &[u8]) -> String {
    String::from_utf8_lossy(record)
        .trim_end_matches('\0')
        .to_string()
}

/// Remove a leftover demo file; a missing file is fine
fn reset_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Write five single-record pages through a 3-frame pool, read them back,
/// and report what each policy evicted.
fn run_demo(dir: &Path) -> Result<()> {
    for policy in PolicyKind::ALL {
        let path = dir.join(format!("demo-{}.bin", policy));
        reset_file(&path)?;

        let store = FilePageStore::open(&path, false)?;
        let mut pool = BufferPool::new(Box::new(store), 3, policy)?;

        for i in 0..5u8 {
            let mut page = SlottedPage::new();
            page.insert_record(&[b'A' + i, 0])?;
            pool.write_page(PageId::new(i as u32), page)?;
        }
        for i in 0..5 {
            let record = pool.fetch_page(PageId::new(i))?.get_record(0)?;
            println!("[{}] page {} -> {}", policy, i, printable(&record));
        }

        let resident = pool.resident_pages();
        pool.flush_all()?;
        println!(
            "[{}] resident before flush: {:?} stats: {}",
            policy,
            resident.iter().map(|id| id.value()).collect::<Vec<_>>(),
            serde_json::to_string(&pool.stats()).unwrap_or_default()
        );
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let (config, rest) = if args[1] == "--config" {
        if args.len() < 4 {
            usage();
        }
        match Config::from_json_file(Path::new(&args[2])) {
            Ok(config) => (config, &args[3..]),
            Err(e) => fail(e),
        }
    } else {
        (Config::new(&args[1]), &args[2..])
    };

    let command = rest[0].as_str();

    if command == "demo" {
        let dir = config
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if let Err(e) = run_demo(dir) {
            fail(e);
        }
        return;
    }

    let db = match Db::open(config) {
        Ok(db) => db,
        Err(e) => fail(format!("Failed to open page file: {}", e)),
    };

    match command {
        "insert" => {
            let page_id = parse_page(rest.get(1));
            let text = rest.get(2).unwrap_or_else(|| usage());
            match db.insert_record(page_id, text.as_bytes()) {
                Ok(index) => println!("INSERTED: page {} record {}", page_id, index),
                Err(e) => fail(e),
            }
        }

        "get" => {
            let page_id = parse_page(rest.get(1));
            let index = parse_index(rest.get(2));
            match db.read_record(page_id, index) {
                Ok(record) => println!("{}", printable(&record)),
                Err(e) => fail(e),
            }
        }

        "dump" => {
            let page_id = parse_page(rest.get(1));
            let dump = db.with_page(page_id, |page| -> Result<(Vec<Vec<u8>>, usize)> {
                Ok((page.records()?, page.free_space()))
            });
            match dump {
                Ok(Ok((records, free))) => {
                    println!("COUNT: {}", records.len());
                    println!("FREE: {}", free);
                    for (i, record) in records.iter().enumerate() {
                        println!("{}: {}", i, printable(record));
                    }
                }
                Ok(Err(e)) | Err(e) => fail(e),
            }
        }

        "find" => {
            let page_id = parse_page(rest.get(1));
            let key = rest.get(2).unwrap_or_else(|| usage());
            match db.with_page(page_id, |page| page.find_record_by_key(key.as_bytes())) {
                Ok(Ok(index)) => println!("FOUND: {}", index),
                Ok(Err(pagecache::StorageError::NotFound)) => println!("NOT_FOUND"),
                Ok(Err(e)) | Err(e) => fail(e),
            }
        }

        "delete" => {
            let page_id = parse_page(rest.get(1));
            let index = parse_index(rest.get(2));
            match db.with_page_mut(page_id, |page| page.delete_record(index)) {
                Ok(record) => println!("DELETED: {}", printable(&record)),
                Err(e) => fail(e),
            }
        }

        "compact" => {
            let page_id = parse_page(rest.get(1));
            match db.with_page_mut(page_id, |page| {
                page.compact_page()?;
                Ok(page.free_space())
            }) {
                Ok(free) => println!("COMPACTED: {} bytes free", free),
                Err(e) => fail(e),
            }
        }

        "stats" => {
            let stats = db.stats();
            println!("capacity: {}", db.config().capacity);
            println!("policy: {}", db.config().policy);
            match db.page_count() {
                Ok(count) => println!("page_count: {}", count),
                Err(e) => fail(e),
            }
            println!("hits: {}", stats.hits);
            println!("misses: {}", stats.misses);
            println!("evictions: {}", stats.evictions);
            println!("write_backs: {}", stats.write_backs);
        }

        _ => {
            eprintln!("Unknown command: {}", command);
            exit(1);
        }
    }

    // Ensure data is persisted
    if let Err(e) = db.flush() {
        eprintln!("Warning: Failed to flush: {}", e);
    }
}
