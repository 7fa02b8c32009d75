//! Capacity-bounded FIFO channel.
//!
//! ## Contents
//! - [`BoundedChannel`] fixed-capacity buffer with non-blocking `offer` and
//!   waiting `take`/`recv`
//!
//! ## Quick reference
//! - **Producers** never wait: a full channel rejects the offer and hands the
//!   item back ([`OfferError::Full`](crate::OfferError::Full)).
//! - **Consumers** suspend on a [`tokio::sync::Notify`] until an item arrives,
//!   the timeout elapses, or the channel closes.
//! - One mutex guards the buffer; it is never held across an `.await`.

mod bounded;

pub use bounded::BoundedChannel;
