//! Command-line parsing.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use marketdesk_core::models::{PageQuery, Period};

pub const USAGE: &str = "\
Usage: marketdesk <command> [args]

Account:
  login [email] [--remember]     Sign in (password from keychain or prompt)
  logout                         Sign out and clear local data
  whoami                         Show the signed-in admin
  forgot <email>                 Mail a one-time reset code
  verify <email> <otp>           Check a reset code
  reset <email> <otp>            Set a new password with a reset code
  change-password                Change the signed-in admin's password

Dashboard:
  overview [--refresh]           Revenue, seller and user totals
  revenue [period] [--refresh]   Revenue this vs last period (day|week|month|year)
  joining [period] [--refresh]   New users and sellers per period

Catalog:
  categories [page] [--search s] [--refresh]
  category-add <name> [color] [parent-id]
  category-delete <id>
  products [page] [--search s] [--refresh]
  product-approve <id>
  product-reject <id>

Members:
  sellers [page] [--search s] [--refresh]
  seller-requests [page] [--refresh]
  seller-approve <id>
  seller-reject <id>
  buyers [page] [--search s] [--refresh]

Marketing:
  banners [page] [--refresh]
  banner-upload <file>
  banner-delete <id>
  plans [--refresh]
  plan-delete <id>

Set RUST_LOG=debug for verbose logging.";

/// Options shared by the list commands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListArgs {
    pub query: PageQuery,
    pub refresh: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { email: Option<String>, remember: bool },
    Logout,
    WhoAmI,
    Forgot { email: String },
    Verify { email: String, otp: String },
    Reset { email: String, otp: String },
    ChangePassword,
    Overview { refresh: bool },
    Revenue { period: Period, refresh: bool },
    Joining { period: Period, refresh: bool },
    Categories(ListArgs),
    CategoryAdd { name: String, color: Option<String>, parent: Option<String> },
    CategoryDelete { id: String },
    Products(ListArgs),
    ProductApprove { id: String },
    ProductReject { id: String },
    Sellers(ListArgs),
    SellerRequests(ListArgs),
    SellerApprove { id: String },
    SellerReject { id: String },
    Buyers(ListArgs),
    Banners(ListArgs),
    BannerUpload { path: PathBuf },
    BannerDelete { id: String },
    Plans { refresh: bool },
    PlanDelete { id: String },
}

impl Command {
    /// Parse the arguments after the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        let mut args = Args::new(rest);

        let command = match name.as_str() {
            "help" | "-h" | "--help" => Command::Help,
            "login" => Command::Login {
                remember: args.flag("--remember"),
                email: args.optional(),
            },
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "forgot" => Command::Forgot {
                email: args.required("email")?,
            },
            "verify" => Command::Verify {
                email: args.required("email")?,
                otp: args.required("otp")?,
            },
            "reset" => Command::Reset {
                email: args.required("email")?,
                otp: args.required("otp")?,
            },
            "change-password" => Command::ChangePassword,
            "overview" => Command::Overview {
                refresh: args.flag("--refresh"),
            },
            "revenue" => Command::Revenue {
                refresh: args.flag("--refresh"),
                period: args.period()?,
            },
            "joining" => Command::Joining {
                refresh: args.flag("--refresh"),
                period: args.period()?,
            },
            "categories" => Command::Categories(args.list()?),
            "category-add" => Command::CategoryAdd {
                name: args.required("name")?,
                color: args.optional(),
                parent: args.optional(),
            },
            "category-delete" => Command::CategoryDelete {
                id: args.required("id")?,
            },
            "products" => Command::Products(args.list()?),
            "product-approve" => Command::ProductApprove {
                id: args.required("id")?,
            },
            "product-reject" => Command::ProductReject {
                id: args.required("id")?,
            },
            "sellers" => Command::Sellers(args.list()?),
            "seller-requests" => Command::SellerRequests(args.list()?),
            "seller-approve" => Command::SellerApprove {
                id: args.required("id")?,
            },
            "seller-reject" => Command::SellerReject {
                id: args.required("id")?,
            },
            "buyers" => Command::Buyers(args.list()?),
            "banners" => Command::Banners(args.list()?),
            "banner-upload" => Command::BannerUpload {
                path: PathBuf::from(args.required("file")?),
            },
            "banner-delete" => Command::BannerDelete {
                id: args.required("id")?,
            },
            "plans" => Command::Plans {
                refresh: args.flag("--refresh"),
            },
            "plan-delete" => Command::PlanDelete {
                id: args.required("id")?,
            },
            other => bail!("Unknown command '{}'. Run `marketdesk help` for usage.", other),
        };

        args.finish(name)?;
        Ok(command)
    }
}

/// Remaining arguments of a command, consumed as they are recognized.
struct Args {
    rest: Vec<String>,
}

impl Args {
    fn new(rest: &[String]) -> Self {
        Self { rest: rest.to_vec() }
    }

    fn flag(&mut self, name: &str) -> bool {
        match self.rest.iter().position(|a| a == name) {
            Some(i) => {
                self.rest.remove(i);
                true
            }
            None => false,
        }
    }

    fn option(&mut self, name: &str) -> Result<Option<String>> {
        let Some(i) = self.rest.iter().position(|a| a == name) else {
            return Ok(None);
        };
        if i + 1 >= self.rest.len() {
            bail!("{} needs a value", name);
        }
        let value = self.rest.remove(i + 1);
        self.rest.remove(i);
        Ok(Some(value))
    }

    fn optional(&mut self) -> Option<String> {
        if self.rest.is_empty() || self.rest[0].starts_with("--") {
            None
        } else {
            Some(self.rest.remove(0))
        }
    }

    fn required(&mut self, what: &str) -> Result<String> {
        self.optional().ok_or_else(|| anyhow!("Missing <{}>", what))
    }

    fn period(&mut self) -> Result<Period> {
        match self.optional() {
            Some(p) => p.parse().map_err(|e: String| anyhow!(e)),
            None => Ok(Period::default()),
        }
    }

    fn list(&mut self) -> Result<ListArgs> {
        let refresh = self.flag("--refresh");
        let search = self.option("--search")?;
        let page = match self.optional() {
            Some(p) => p
                .parse::<u32>()
                .map_err(|_| anyhow!("Page must be a positive number, got '{}'", p))?,
            None => 1,
        };

        let mut query = PageQuery::new(page);
        if let Some(search) = search {
            query = query.with_search(search);
        }
        Ok(ListArgs { query, refresh })
    }

    fn finish(self, command: &str) -> Result<()> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            bail!("Unexpected arguments for '{}': {}", command, self.rest.join(" "))
        }
    }
}
