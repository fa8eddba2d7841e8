//! Checkout state machine.
//!
//! Sequences address capture -> payment selection -> order submission, once
//! the cart is non-empty and the session is authenticated. The payload is
//! snapshotted from the cart at the instant a submission starts, so cart
//! edits made while the request is in flight never leak into the order; the
//! cart is cleared exactly once, and only on success.
//!
//! A flow instance is cheap and disposable: `Succeeded` is terminal (start a
//! fresh flow for the next purchase), and abandoning a flow is just dropping
//! it - dropping an in-flight submission future aborts the HTTP request, and
//! no other resource is held.

use std::sync::Arc;

use tracing::{debug, warn};

use quitanda_core::PaymentMethod;

use crate::cart::CartStore;
use crate::gateway::types::OrderDraft;
use crate::gateway::{ApiError, RemoteGateway};
use crate::models::{Address, AddressFieldError, Order};
use crate::session::SessionStore;

/// Where a checkout flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Capturing the delivery address (initial step).
    CollectingAddress,
    /// Address accepted; choosing the payment method. A failed submission
    /// also lands back here, with the error attached to the flow, so the
    /// user can retry.
    CollectingPayment,
    /// An order submission is in flight.
    Submitting,
    /// The order was accepted. Terminal: discard the flow.
    Succeeded,
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CollectingAddress => write!(f, "address"),
            Self::CollectingPayment => write!(f, "payment"),
            Self::Submitting => write!(f, "submitting"),
            Self::Succeeded => write!(f, "succeeded"),
        }
    }
}

/// Errors from checkout operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Checkout cannot start on an empty cart; send the user back to the
    /// cart view.
    #[error("cart is empty")]
    EmptyCart,

    /// The address failed validation; the flow stays at the address step.
    #[error("address validation failed: {}", format_address_errors(.0))]
    InvalidAddress(Vec<AddressFieldError>),

    /// The session is not authenticated (it may have expired while the user
    /// filled the form). The flow stays at the payment step.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A submission is already in flight; the duplicate call is rejected.
    #[error("an order submission is already in progress")]
    SubmissionInFlight,

    /// The operation does not apply to the flow's current step.
    #[error("checkout is at the {actual} step, expected {expected}")]
    WrongStep {
        expected: CheckoutState,
        actual: CheckoutState,
    },

    /// The remote call failed; see the classified error.
    #[error(transparent)]
    Api(#[from] ApiError),
}

fn format_address_errors(errors: &[AddressFieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One checkout attempt, from address entry to order confirmation.
pub struct CheckoutFlow {
    state: CheckoutState,
    gateway: Arc<dyn RemoteGateway>,
    address: Option<Address>,
    payment_method: Option<PaymentMethod>,
    order: Option<Order>,
    last_error: Option<String>,
}

impl CheckoutFlow {
    /// Start a checkout for the current cart.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] if the cart has no lines - the flow
    /// refuses to start and the caller should redirect to the cart view.
    pub fn begin(cart: &CartStore, gateway: Arc<dyn RemoteGateway>) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        debug!("checkout started");
        Ok(Self {
            state: CheckoutState::CollectingAddress,
            gateway,
            address: None,
            payment_method: None,
            order: None,
            last_error: None,
        })
    }

    /// The flow's current step.
    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// The address draft, once one was accepted.
    #[must_use]
    pub const fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// The most recently chosen payment method.
    #[must_use]
    pub const fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// The confirmed order, once the flow succeeded.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// User-facing message of the last failed submission, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Accept the delivery address and advance to payment selection.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidAddress`] with every failing field if
    /// validation fails (the flow stays at the address step), or
    /// [`CheckoutError::WrongStep`] outside the address step.
    pub fn submit_address(&mut self, address: Address) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::CollectingAddress {
            return Err(CheckoutError::WrongStep {
                expected: CheckoutState::CollectingAddress,
                actual: self.state,
            });
        }

        if let Err(errors) = address.validate() {
            return Err(CheckoutError::InvalidAddress(errors));
        }

        self.address = Some(address);
        self.state = CheckoutState::CollectingPayment;
        debug!("checkout advanced to payment selection");
        Ok(())
    }

    /// Go back from payment selection to the address step, preserving the
    /// address draft for editing. No-op at any other step.
    pub fn back_to_address(&mut self) {
        if self.state == CheckoutState::CollectingPayment {
            self.state = CheckoutState::CollectingAddress;
            debug!("checkout returned to address step");
        }
    }

    /// Submit the order with the chosen payment method.
    ///
    /// Re-verifies authentication at call time (a session can expire while
    /// the user fills the form), snapshots the cart lines and total at this
    /// instant, and submits. On success the cart is cleared exactly once and
    /// the server-assigned [`Order`] is returned; on failure the cart is
    /// untouched and the flow rolls back to the payment step with the error
    /// attached, ready for a retry.
    ///
    /// Only one submission can be in flight per flow; a second call while
    /// `Submitting` is rejected. Dropping the returned future aborts the
    /// request without touching the cart.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::NotAuthenticated`] when the session lapsed,
    /// [`CheckoutError::SubmissionInFlight`] on a duplicate call, and
    /// [`CheckoutError::Api`] for remote failures. An expired token
    /// additionally invalidates the session.
    pub async fn submit_payment(
        &mut self,
        method: PaymentMethod,
        cart: &CartStore,
        session: &SessionStore,
    ) -> Result<Order, CheckoutError> {
        match self.state {
            CheckoutState::Submitting => return Err(CheckoutError::SubmissionInFlight),
            CheckoutState::CollectingPayment => {}
            actual => {
                return Err(CheckoutError::WrongStep {
                    expected: CheckoutState::CollectingPayment,
                    actual,
                });
            }
        }

        let Some(token) = session.token() else {
            return Err(CheckoutError::NotAuthenticated);
        };
        let Some(delivery_address) = self.address.clone() else {
            // Unreachable through the public API: payment step implies an
            // accepted address.
            return Err(CheckoutError::WrongStep {
                expected: CheckoutState::CollectingAddress,
                actual: self.state,
            });
        };

        self.payment_method = Some(method);
        let (lines, total) = cart.snapshot();
        let draft = OrderDraft {
            lines,
            total,
            payment_method: method,
            delivery_address,
        };

        self.state = CheckoutState::Submitting;
        debug!(total = %draft.total, "submitting order");

        match self.gateway.create_order(&token, &draft).await {
            Ok(order) => {
                cart.clear();
                self.order = Some(order.clone());
                self.last_error = None;
                self.state = CheckoutState::Succeeded;
                debug!(order_id = %order.id, "order confirmed");
                Ok(order)
            }
            Err(e) => {
                if e.is_session_expired() {
                    // The token died while the user was in checkout.
                    session.invalidate();
                }
                warn!(error = %e, "order submission failed");
                self.last_error = Some(e.to_string());
                self.state = CheckoutState::CollectingPayment;
                Err(e.into())
            }
        }
    }
}
