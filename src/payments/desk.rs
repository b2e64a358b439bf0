//! Manual payment verification desk.
//!
//! Submissions move the user to Pending; approvals are routed through the
//! coordinator mailbox so they never race an in-flight download decision.

use crate::coordinator::CoordinatorHandle;
use crate::domain::{Clock, Tier};
use crate::payments::ledger::{
    generate_request_id, PaymentLedger, PaymentMethod, PaymentRequest, PaymentStatus,
};
use anyhow::{bail, Context, Result};
use std::sync::Arc;

/// Minimum phone number length, counted in characters after trimming.
pub const MIN_PHONE_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    /// Approved requests times the premium price, in BDT.
    pub revenue: u64,
}

pub struct PaymentDesk {
    ledger: PaymentLedger,
    coordinator: CoordinatorHandle,
    clock: Arc<dyn Clock>,
    premium_price: u32,
}

impl PaymentDesk {
    pub fn new(
        ledger: PaymentLedger,
        coordinator: CoordinatorHandle,
        clock: Arc<dyn Clock>,
        premium_price: u32,
    ) -> Self {
        Self {
            ledger,
            coordinator,
            clock,
            premium_price,
        }
    }

    /// Records a payment submission and marks the user Pending.
    pub async fn submit(&self, phone: &str, method: PaymentMethod) -> Result<PaymentRequest> {
        let phone = phone.trim();
        if phone.chars().count() < MIN_PHONE_LEN {
            bail!(
                "Please enter a valid phone number (at least {} digits)",
                MIN_PHONE_LEN
            );
        }

        let record = self.coordinator.user_record().await?;
        if record.tier == Tier::Premium {
            bail!("User {} is already Premium", record.username.as_str());
        }

        let request = PaymentRequest {
            id: generate_request_id(),
            user_id: record.id.to_string(),
            username: record.username.as_str().to_string(),
            phone_number: phone.to_string(),
            method,
            timestamp: self.clock.now_millis(),
            status: PaymentStatus::Pending,
        };
        self.ledger.append(request.clone())?;
        self.coordinator.mark_pending().await?;

        tracing::info!(
            request_id = request.id.as_str(),
            method = %method,
            "Payment submitted"
        );
        Ok(request)
    }

    /// Approves a pending request. The local user is upgraded when the
    /// request belongs to it.
    pub async fn approve(&self, request_id: &str) -> Result<PaymentRequest> {
        let mut requests = self.ledger.load()?;
        let index = find_pending(&requests, request_id)?;

        let record = self.coordinator.user_record().await?;
        if requests[index].user_id == record.id.to_string() {
            self.coordinator
                .approve(&record.id)
                .await
                .context("Failed to upgrade user")?;
        } else {
            tracing::warn!(
                request_id,
                user_id = requests[index].user_id.as_str(),
                "Approved request belongs to another installation"
            );
        }

        requests[index].status = PaymentStatus::Approved;
        self.ledger.save(&requests)?;
        tracing::info!(request_id, "Payment approved");
        Ok(requests[index].clone())
    }

    /// Rejects a pending request. The user's tier is left as is.
    pub fn reject(&self, request_id: &str) -> Result<PaymentRequest> {
        let mut requests = self.ledger.load()?;
        let index = find_pending(&requests, request_id)?;
        requests[index].status = PaymentStatus::Rejected;
        self.ledger.save(&requests)?;
        tracing::info!(request_id, "Payment rejected");
        Ok(requests[index].clone())
    }

    pub fn list(&self) -> Result<Vec<PaymentRequest>> {
        self.ledger.load()
    }

    pub fn stats(&self) -> Result<PaymentStats> {
        let requests = self.ledger.load()?;
        let count = |status| requests.iter().filter(|r| r.status == status).count();
        let approved = count(PaymentStatus::Approved);
        Ok(PaymentStats {
            total: requests.len(),
            pending: count(PaymentStatus::Pending),
            approved,
            revenue: approved as u64 * u64::from(self.premium_price),
        })
    }
}

fn find_pending(requests: &[PaymentRequest], request_id: &str) -> Result<usize> {
    let Some(index) = requests.iter().position(|r| r.id == request_id) else {
        bail!("No payment request with id '{}'", request_id);
    };
    let status = requests[index].status;
    if status != PaymentStatus::Pending {
        bail!("Payment request '{}' is already {}", request_id, status);
    }
    Ok(index)
}

#[cfg(test)]
#[path = "tests/desk_tests.rs"]
mod tests;
