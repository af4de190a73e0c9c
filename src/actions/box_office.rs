//! In-process ticket desk.
//!
//! There is no real ticketing provider behind marquee, so purchases are
//! recorded in a ledger that lives as long as the process. The confirm step
//! only restates the order; whether the user agreed is decided by the
//! conversation, not by this ledger.

use std::fmt;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::TicketOrder;

/// Proof of a completed purchase.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub confirmation: String,
    pub order: TicketOrder,
    pub purchased_at: DateTime<Utc>,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket purchased for {} at {} for the {} showing. Confirmation code: {} (purchased {}).",
            self.order.movie,
            self.order.theater,
            self.order.showtime,
            self.confirmation,
            self.purchased_at.format("%Y-%m-%d %H:%M UTC"),
        )
    }
}

/// Records ticket purchases for the lifetime of the process.
#[derive(Default)]
pub struct BoxOffice {
    ledger: Mutex<Vec<Receipt>>,
}

impl BoxOffice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text asking the user to confirm the order before `buy_ticket` runs.
    pub fn confirmation_request(&self, order: &TicketOrder) -> String {
        format!(
            "Please confirm the purchase: one ticket for {} at {}, showtime {}. \
Reply yes to buy the ticket or no to cancel.",
            order.movie, order.theater, order.showtime
        )
    }

    /// Records a purchase and returns its receipt.
    pub fn purchase(&self, order: &TicketOrder) -> Result<Receipt> {
        for (field, value) in [
            ("theater", &order.theater),
            ("movie", &order.movie),
            ("showtime", &order.showtime),
        ] {
            if value.trim().is_empty() {
                bail!("Cannot buy a ticket without a {field}");
            }
        }

        let receipt = Receipt {
            confirmation: Uuid::new_v4().simple().to_string()[..8].to_uppercase(),
            order: order.clone(),
            purchased_at: Utc::now(),
        };
        self.ledger
            .lock()
            .map_err(|_| anyhow!("Ticket ledger is unavailable"))?
            .push(receipt.clone());
        Ok(receipt)
    }

    /// Number of tickets sold so far.
    pub fn sold(&self) -> usize {
        self.ledger.lock().map(|l| l.len()).unwrap_or(0)
    }
}
