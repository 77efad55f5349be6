//! Command handlers.

use std::path::Path;

use anyhow::{bail, Context, Result};
use marketdesk_core::api::ApiError;
use marketdesk_core::cache::CacheManager;
use marketdesk_core::config::Config;
use marketdesk_core::models::{
    normalize_joining, normalize_revenue, Banner, Buyer, Category, CategoryInput, JoiningReport,
    Overview, Page, PageQuery, Period, Product, RevenueReport, Seller, SubscriptionPlan,
};
use marketdesk_core::utils::{format_money, format_optional, format_remaining};
use marketdesk_core::{AdminClient, CredentialStore};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::args::{Command, ListArgs, USAGE};
use crate::output::{page_footer, Table};

/// Keychain service the remembered passwords are filed under.
const KEYRING_SERVICE: &str = "marketdesk";

pub struct App {
    pub client: AdminClient,
    pub cache: CacheManager,
    pub config: Config,
    credentials: CredentialStore,
}

impl App {
    pub fn new(client: AdminClient, cache: CacheManager, config: Config) -> Self {
        Self {
            client,
            cache,
            config,
            credentials: CredentialStore::new(KEYRING_SERVICE),
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Help => println!("{}", USAGE),
            Command::Login { email, remember } => self.login(email, remember).await?,
            Command::Logout => self.logout(),
            Command::WhoAmI => self.whoami(),
            Command::Forgot { email } => {
                let reply = self.client.auth().forgot_password(&email).await?;
                println!("{}", reply_text(&reply.message, "A reset code was sent"));
            }
            Command::Verify { email, otp } => {
                let reply = self.client.auth().verify_otp(&email, &otp).await?;
                println!("{}", reply_text(&reply.message, "Code verified"));
            }
            Command::Reset { email, otp } => self.reset_password(&email, &otp).await?,
            Command::ChangePassword => self.change_password().await?,
            Command::Overview { refresh } => self.overview(refresh).await?,
            Command::Revenue { period, refresh } => self.revenue(period, refresh).await?,
            Command::Joining { period, refresh } => self.joining(period, refresh).await?,
            Command::Categories(list) => self.categories(list).await?,
            Command::CategoryAdd { name, color, parent } => {
                let mut input = CategoryInput::new(name);
                if let Some(color) = color {
                    input = input.with_color(color);
                }
                if let Some(parent) = parent {
                    input = input.with_parent(parent);
                }
                self.client.create_category(&input).await?;
                self.mutated("categories", "Category created");
            }
            Command::CategoryDelete { id } => {
                self.client.delete_category(&id).await?;
                self.mutated("categories", "Category deleted");
            }
            Command::Products(list) => self.products(list).await?,
            Command::ProductApprove { id } => {
                self.client.approve_product(&id).await?;
                self.mutated("products", "Product approved");
            }
            Command::ProductReject { id } => {
                self.client.reject_product(&id).await?;
                self.mutated("products", "Product rejected");
            }
            Command::Sellers(list) => self.sellers(list, false).await?,
            Command::SellerRequests(list) => self.sellers(list, true).await?,
            Command::SellerApprove { id } => {
                self.client.approve_seller(&id).await?;
                self.mutated("sellers", "Seller approved");
            }
            Command::SellerReject { id } => {
                self.client.reject_seller(&id).await?;
                self.mutated("sellers", "Seller rejected");
            }
            Command::Buyers(list) => self.buyers(list).await?,
            Command::Banners(list) => self.banners(list).await?,
            Command::BannerUpload { path } => {
                ensure_file(&path)?;
                self.client.upload_banner(&path).await?;
                self.mutated("banners", "Banner uploaded");
            }
            Command::BannerDelete { id } => {
                self.client.delete_banner(&id).await?;
                self.mutated("banners", "Banner deleted");
            }
            Command::Plans { refresh } => self.plans(refresh).await?,
            Command::PlanDelete { id } => {
                self.client.delete_plan(&id).await?;
                self.mutated("plans", "Subscription plan deleted");
            }
        }
        Ok(())
    }

    /// Drop the local session and everything cached under it.
    pub fn sign_out(&self) {
        self.client.sign_out();
        if let Err(e) = self.cache.invalidate("") {
            warn!(error = %e, "Failed to clear response cache");
        }
    }

    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    async fn login(&mut self, email: Option<String>, remember: bool) -> Result<()> {
        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => bail!("Missing <email>. Usage: marketdesk login <email> [--remember]"),
        };

        if let Some(password) = self.credentials.recall(&email) {
            match self.client.sign_in(&email, &password).await {
                Ok(token) => return self.signed_in(&email, &token.principal.name),
                Err(e) if is_invalid_credentials(&e) => {
                    warn!("Remembered password was rejected, forgetting it");
                    if let Err(e) = self.credentials.forget(&email) {
                        debug!(error = %e, "Failed to forget password");
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let password = prompt_password(&format!("Password for {}: ", email))?;
        let token = self.client.sign_in(&email, &password).await?;

        if remember {
            match self.credentials.remember(&email, &password) {
                Ok(()) => info!("Password saved to keychain"),
                Err(e) => eprintln!("Warning: could not save password: {:#}", e),
            }
        }
        self.signed_in(&email, &token.principal.name)
    }

    fn signed_in(&mut self, email: &str, name: &str) -> Result<()> {
        // Start from an empty cache so nothing from a previous account shows
        if let Err(e) = self.cache.invalidate("") {
            warn!(error = %e, "Failed to clear response cache");
        }
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        println!("Signed in as {}", if name.is_empty() { email } else { name });
        Ok(())
    }

    fn logout(&self) {
        let was_signed_in = self.client.session().is_signed_in();
        self.sign_out();
        if was_signed_in {
            println!("Signed out");
        } else {
            println!("Not signed in");
        }
    }

    fn whoami(&self) {
        let Some(token) = self.client.session().current() else {
            println!("Not signed in");
            return;
        };
        let principal = &token.principal;
        let name = Some(principal.name.as_str()).filter(|n| !n.is_empty());
        let role = Some(principal.role.as_str()).filter(|r| !r.is_empty());
        println!("{} <{}>", format_optional(name, "(no name)"), principal.email);
        println!("Role: {}", format_optional(role, "-"));
        let remaining = token.remaining_ms(chrono::Utc::now().timestamp_millis());
        if remaining > 0 {
            println!("Access token valid for {}", format_remaining(remaining));
        } else {
            println!("Access token expired; it will be refreshed on the next request");
        }
    }

    async fn reset_password(&self, email: &str, otp: &str) -> Result<()> {
        let password = prompt_new_password()?;
        let reply = self.client.auth().reset_password(email, otp, &password).await?;
        println!("{}", reply_text(&reply.message, "Password reset. You can log in now."));
        Ok(())
    }

    async fn change_password(&self) -> Result<()> {
        if !self.client.session().is_signed_in() {
            return Err(ApiError::NotSignedIn.into());
        }
        let old = prompt_password("Current password: ")?;
        let new = prompt_password("New password: ")?;
        let confirm = prompt_password("Confirm new password: ")?;
        let reply = self.client.change_password(&old, &new, &confirm).await?;
        println!("{}", reply_text(&reply.message, "Password changed"));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------

    async fn overview(&self, refresh: bool) -> Result<()> {
        let overview: Overview = self
            .cached("overview", refresh, || self.client.overview())
            .await?;
        println!("Total revenue:  {}", format_money(overview.total_revenue));
        println!("Total sellers:  {}", overview.total_sellers);
        println!("Total users:    {}", overview.total_users);
        Ok(())
    }

    async fn revenue(&self, period: Period, refresh: bool) -> Result<()> {
        let key = format!("revenue-{}", period);
        let report: RevenueReport = self
            .cached(&key, refresh, || self.client.revenue_report(period))
            .await?;

        let mut table = Table::new(&["", "This period", "Last period"]);
        for row in normalize_revenue(&report) {
            table.row(vec![
                row.label,
                row.current.map(format_money).unwrap_or_default(),
                row.previous.map(format_money).unwrap_or_default(),
            ]);
        }
        print_report(&format!("Revenue: this {} vs last {}", period.title(), period.title()), &table);
        Ok(())
    }

    async fn joining(&self, period: Period, refresh: bool) -> Result<()> {
        let key = format!("joining-{}", period);
        let report: JoiningReport = self
            .cached(&key, refresh, || self.client.joining_report(period))
            .await?;

        let mut table = Table::new(&["", "Users", "Sellers"]);
        for row in normalize_joining(&report) {
            table.row(vec![
                row.label,
                row.users.map(|n| n.to_string()).unwrap_or_default(),
                row.sellers.map(|n| n.to_string()).unwrap_or_default(),
            ]);
        }
        print_report(&format!("New users and sellers per {}", period), &table);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    async fn categories(&self, list: ListArgs) -> Result<()> {
        let key = list.query.cache_key("categories");
        let page: Page<Category> = self
            .cached(&key, list.refresh, || self.client.list_categories(&list.query))
            .await?;

        let mut table = Table::new(&["ID", "Name", "Parent", "Color", "Created"]);
        for category in &page.items {
            let parent = category.parent.as_ref().map(|p| p.name().unwrap_or(p.id()).to_string());
            table.row(vec![
                category.id.clone(),
                category.name.clone(),
                parent.unwrap_or_default(),
                category.color.clone().unwrap_or_default(),
                category.display_date(),
            ]);
        }
        print_page(&table, &page, &list.query);
        Ok(())
    }

    async fn products(&self, list: ListArgs) -> Result<()> {
        let key = list.query.cache_key("products");
        let page: Page<Product> = self
            .cached(&key, list.refresh, || self.client.list_products(&list.query))
            .await?;

        let mut table = Table::new(&["ID", "Product ID", "Name", "Price", "Qty", "Verified"]);
        for product in &page.items {
            table.row(vec![
                product.id.clone(),
                product.product_id().to_string(),
                product.title.clone(),
                product.display_price(),
                product.stock.map(|s| s.to_string()).unwrap_or_default(),
                product.display_verified().to_string(),
            ]);
        }
        print_page(&table, &page, &list.query);
        Ok(())
    }

    async fn sellers(&self, list: ListArgs, pending: bool) -> Result<()> {
        let page: Page<Seller> = if pending {
            let key = list.query.cache_key("sellers-pending");
            self.cached(&key, list.refresh, || self.client.seller_requests(&list.query))
                .await?
        } else {
            let key = list.query.cache_key("sellers");
            self.cached(&key, list.refresh, || self.client.list_sellers(&list.query))
                .await?
        };

        let mut table = Table::new(&["ID", "Name", "Email", "Shop", "Joined"]);
        for seller in &page.items {
            table.row(vec![
                seller.id.clone(),
                seller.name.clone(),
                seller.email.clone(),
                seller.shop().to_string(),
                seller.display_date(),
            ]);
        }
        print_page(&table, &page, &list.query);
        Ok(())
    }

    async fn buyers(&self, list: ListArgs) -> Result<()> {
        let key = list.query.cache_key("buyers");
        let page: Page<Buyer> = self
            .cached(&key, list.refresh, || self.client.list_buyers(&list.query))
            .await?;

        let mut table = Table::new(&["ID", "Name", "Orders", "Delivered", "Status"]);
        for buyer in &page.items {
            table.row(vec![
                buyer.id.clone(),
                buyer.name.clone(),
                buyer.total_orders.to_string(),
                buyer.delivered_orders.to_string(),
                format_optional(buyer.status.as_deref(), "-"),
            ]);
        }
        print_page(&table, &page, &list.query);
        Ok(())
    }

    async fn banners(&self, list: ListArgs) -> Result<()> {
        let key = list.query.cache_key("banners");
        let page: Page<Banner> = self
            .cached(&key, list.refresh, || self.client.list_banners(&list.query))
            .await?;

        let mut table = Table::new(&["ID", "Image", "Created"]);
        for banner in &page.items {
            table.row(vec![
                banner.id.clone(),
                format_optional(banner.image_url(), "-"),
                banner.display_date(),
            ]);
        }
        print_page(&table, &page, &list.query);
        Ok(())
    }

    async fn plans(&self, refresh: bool) -> Result<()> {
        let page: Page<SubscriptionPlan> = self
            .cached("plans", refresh, || self.client.list_plans())
            .await?;

        let mut table = Table::new(&["ID", "Plan", "Pricing", "Features"]);
        for plan in &page.items {
            table.row(vec![
                plan.id.clone(),
                plan.name.clone(),
                plan.display_pricing(),
                plan.features.join(", "),
            ]);
        }
        if table.is_empty() {
            println!("No subscription plans");
        } else {
            println!("{}", table.render());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cache plumbing
    // ------------------------------------------------------------------

    /// Serve `name` from the cache while it is fresh, otherwise fetch and
    /// store it. Cache write failures are logged and ignored.
    async fn cached<T, F, Fut>(&self, name: &str, refresh: bool, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        if !refresh {
            if let Some(cached) = self.cache.fresh::<T>(name) {
                debug!(cache = name, age = %cached.age_display(), "Serving from cache");
                return Ok(cached.data);
            }
        }

        let data = fetch().await?;
        if let Err(e) = self.cache.save(name, &data) {
            warn!(cache = name, error = %e, "Failed to cache response");
        }
        Ok(data)
    }

    /// After a successful mutation: drop the resource's cached pages and
    /// report.
    fn mutated(&self, resource: &str, message: &str) {
        if let Err(e) = self.cache.invalidate(resource) {
            warn!(resource, error = %e, "Failed to invalidate cache");
        }
        println!("{}", message);
    }
}

fn is_invalid_credentials(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ApiError>(), Some(ApiError::InvalidCredentials(_)))
}

fn reply_text<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() {
        fallback
    } else {
        message
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(password)
}

/// Ask for a new password twice.
fn prompt_new_password() -> Result<String> {
    let password = prompt_password("New password: ")?;
    let confirm = prompt_password("Confirm new password: ")?;
    marketdesk_core::utils::validate_new_password(&password, &confirm)?;
    Ok(password)
}

fn print_report(title: &str, table: &Table) {
    println!("{}", title);
    if table.is_empty() {
        println!("No data for this period");
    } else {
        println!("{}", table.render());
    }
}

fn print_page<T>(table: &Table, page: &Page<T>, query: &PageQuery) {
    if !table.is_empty() {
        println!("{}", table.render());
    }
    println!("{}", page_footer(page, query));
}

/// Fail on a mistyped upload path before the session is touched.
fn ensure_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("No such file: {}", path.display());
    }
    Ok(())
}
