use std::collections::HashSet;

use tracing::{debug, info};
use ulid::Ulid;

use crate::model::*;
use crate::observability;
use crate::ports::{BookingStore, ResourceDirectory, StoreError};

use super::allocator::first_free_table;
use super::conflict::{now_ms, occupancy_span};
use super::duration::estimate_duration;
use super::scorer::certainty_score;
use super::window::confidence_window;
use super::{AdmissionError, Engine};

impl<D: ResourceDirectory, S: BookingStore> Engine<D, S> {
    /// Duration, confidence window, and certainty score for a prospective
    /// request. Pure query: no persistence side effect, safe to call
    /// repeatedly and concurrently.
    pub async fn check_availability(
        &self,
        restaurant_id: Ulid,
        requested_at: Ms,
        party_size: i64,
    ) -> Result<Assessment, AdmissionError> {
        let request = ReservationRequest::new(restaurant_id, requested_at, party_size)?;
        let restaurant = self.directory.restaurant(restaurant_id).await?;
        let assessment = self.assess(&restaurant, &request).await?;
        metrics::counter!(observability::ASSESSMENTS_TOTAL).increment(1);
        Ok(assessment)
    }

    /// Shared head of the pipeline: estimate → window → score.
    async fn assess(
        &self,
        restaurant: &RestaurantState,
        request: &ReservationRequest,
    ) -> Result<Assessment, AdmissionError> {
        let duration_min = estimate_duration(request.party_size)?;
        let window = confidence_window(request.requested_at, &restaurant.buffer_rule);
        let occupancy = occupancy_span(request.requested_at, duration_min);
        let overlapping = self
            .store
            .find_confirmed_overlapping(restaurant.id, None, occupancy)
            .await?;
        let certainty = certainty_score(restaurant, &overlapping, request.party_size);
        Ok(Assessment {
            duration_min,
            window,
            certainty,
        })
    }

    /// The full admission pipeline. Accepts with an instantly-confirmed
    /// booking bound to a table, or rejects with the originating reason.
    /// Any stage failure short-circuits; nothing is retried except a store
    /// conflict, which moves the scan to the next candidate table.
    pub async fn admit(
        &self,
        restaurant_id: Ulid,
        requested_at: Ms,
        party_size: i64,
        requester_id: Ulid,
    ) -> Result<Booking, AdmissionError> {
        let started = std::time::Instant::now();
        let result = self
            .admit_inner(restaurant_id, requested_at, party_size, requester_id)
            .await;
        metrics::histogram!(observability::ADMISSION_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(booking) => {
                metrics::counter!(observability::ADMISSIONS_TOTAL).increment(1);
                metrics::histogram!(observability::CERTAINTY_SCORE)
                    .record(booking.certainty as f64);
                info!(
                    booking = %booking.id,
                    restaurant = %restaurant_id,
                    table = ?booking.table_id,
                    party_size,
                    certainty = booking.certainty,
                    "booking admitted"
                );
            }
            Err(e) => {
                metrics::counter!(
                    observability::REJECTIONS_TOTAL,
                    "reason" => observability::rejection_label(e)
                )
                .increment(1);
                debug!(restaurant = %restaurant_id, party_size, error = %e, "admission rejected");
            }
        }
        result
    }

    async fn admit_inner(
        &self,
        restaurant_id: Ulid,
        requested_at: Ms,
        party_size: i64,
        requester_id: Ulid,
    ) -> Result<Booking, AdmissionError> {
        let request = ReservationRequest::new(restaurant_id, requested_at, party_size)?;
        let restaurant = self.directory.restaurant(restaurant_id).await?;
        let assessment = self.assess(&restaurant, &request).await?;
        let occupancy = occupancy_span(request.requested_at, assessment.duration_min);

        // First fit, retried past tables that lose the insert race. The
        // conditional insert is what upholds the no-double-allocation
        // invariant; the scan only proposes.
        let mut excluded: HashSet<Ulid> = HashSet::new();
        loop {
            let table_id = first_free_table(
                self.store.as_ref(),
                &restaurant,
                &occupancy,
                request.party_size,
                &excluded,
            )
            .await
            .map_err(AdmissionError::from)?
            .ok_or(AdmissionError::NoTableAvailable)?;

            let booking = Booking {
                id: Ulid::new(),
                restaurant_id,
                table_id: Some(table_id),
                requester_id,
                party_size: request.party_size,
                requested_at: request.requested_at,
                duration_min: assessment.duration_min,
                window: assessment.window,
                certainty: assessment.certainty,
                status: BookingStatus::Confirmed,
                created_at: now_ms(),
            };

            match self.store.insert(booking).await {
                Ok(booking) => return Ok(booking),
                Err(StoreError::Conflict(holder)) => {
                    metrics::counter!(observability::ALLOCATION_RETRIES_TOTAL).increment(1);
                    debug!(
                        restaurant = %restaurant_id,
                        table = %table_id,
                        holder = %holder,
                        "lost slot to concurrent admission, trying next table"
                    );
                    excluded.insert(table_id);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Confirmed → Cancelled. The freed table is visible to subsequent
    /// allocation and scoring reads as soon as this returns. Time or
    /// party-size changes are not updates; they are cancel-and-recreate.
    pub async fn cancel(&self, booking_id: Ulid) -> Result<Booking, AdmissionError> {
        let booking = self
            .update_status(booking_id, BookingStatus::Cancelled)
            .await?;
        metrics::counter!(observability::CANCELLATIONS_TOTAL).increment(1);
        info!(booking = %booking.id, restaurant = %booking.restaurant_id, "booking cancelled");
        Ok(booking)
    }

    /// External status action. The engine only ever produces Confirmed and
    /// Cancelled itself; Pending and Completed are reachable through here.
    pub async fn update_status(
        &self,
        booking_id: Ulid,
        status: BookingStatus,
    ) -> Result<Booking, AdmissionError> {
        let current = self.store.booking(booking_id).await?;
        if !current.status.can_transition(status) {
            return Err(AdmissionError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }
        Ok(self.store.update_status(booking_id, status).await?)
    }

    /// Requester history, newest first.
    pub async fn bookings_for_requester(
        &self,
        requester_id: Ulid,
    ) -> Result<Vec<Booking>, AdmissionError> {
        Ok(self.store.bookings_for_requester(requester_id).await?)
    }

    /// Restaurant ledger, oldest first. Unknown restaurants are reported,
    /// not answered with an empty list.
    pub async fn bookings_for_restaurant(
        &self,
        restaurant_id: Ulid,
    ) -> Result<Vec<Booking>, AdmissionError> {
        let restaurant = self.directory.restaurant(restaurant_id).await?;
        Ok(self.store.bookings_for_restaurant(restaurant.id).await?)
    }
}
