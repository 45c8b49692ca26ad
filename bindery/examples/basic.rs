//! Basic example of the Bindery container.

use bindery::prelude::*;
use std::sync::Arc;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Clone)]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

#[derive(Clone)]
struct Config {
    database_url: String,
    debug: bool,
}

struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

#[derive(Clone)]
struct UserService {
    repo: Arc<UserRepository>,
    logger: Arc<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

// === Circular wiring: each side holds a deferred handle ===

struct EventBus {
    audit: Deferred<Arc<AuditLog>>,
}

impl EventBus {
    fn publish(&self, event: &str) {
        if let Some(audit) = self.audit.get() {
            audit.record(event);
        }
    }
}

struct AuditLog {
    bus: Deferred<Arc<EventBus>>,
}

impl AuditLog {
    fn record(&self, event: &str) {
        println!("[AUDIT] {event} (bus wired: {})", self.bus.is_ready());
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("bindery=debug")
        .init();

    let container = Container::new();

    // Config — ready value
    container.bind_instance(Config {
        database_url: "postgres://localhost/myapp".to_string(),
        debug: true,
    })?;

    // Logger — singleton behind a trait object
    container.bind_instance(Arc::new(ConsoleLogger) as Arc<dyn Logger>)?;

    // Database — singleton (depends on Config + Logger)
    container.bind_provider(|r: &Resolver<'_>| {
        let config: Config = r.resolve()?;
        let logger: Arc<dyn Logger> = r.resolve()?;
        Ok(Arc::new(Database {
            url: config.database_url,
            logger,
        }))
    })?;

    // UserRepository — singleton
    container.bind_provider(|r: &Resolver<'_>| {
        let db: Arc<Database> = r.resolve()?;
        Ok(Arc::new(UserRepository { db }))
    })?;

    // UserService — transient (new each time)
    container.bind_provider_with(BindOptions::new().transient(), |r: &Resolver<'_>| {
        let repo: Arc<UserRepository> = r.resolve()?;
        let logger: Arc<dyn Logger> = r.resolve()?;
        Ok(UserService { repo, logger })
    })?;

    println!("✅ Container ready!");
    println!("{container:?}");

    let config: Config = container.resolve()?;
    println!(
        "📋 Config: database_url={}, debug={}",
        config.database_url, config.debug
    );

    let service: UserService = container.resolve()?;
    let result = service.get_user(42);
    println!("👤 {result}");

    // === Invoke: parameters resolved by type ===
    let report = container.invoke(|db: Arc<Database>, config: Config| {
        Ok::<_, BinderyError>(format!(
            "db={}, debug={}",
            db.query("SELECT 1"),
            config.debug
        ))
    })?;
    println!("📊 {report}");

    // === Circular dependencies resolve through deferred handles ===
    container.bind_provider(|r: &Resolver<'_>| {
        Ok(Arc::new(EventBus {
            audit: r.resolve_deferred()?,
        }))
    })?;
    container.bind_provider(|r: &Resolver<'_>| {
        Ok(Arc::new(AuditLog {
            bus: r.resolve_deferred()?,
        }))
    })?;

    let bus: Arc<EventBus> = container.resolve()?;
    bus.publish("user 42 fetched");

    println!("\n🎉 Everything works!");
    Ok(())
}
