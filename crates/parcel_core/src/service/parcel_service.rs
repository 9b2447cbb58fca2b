//! Parcel use-case service.
//!
//! # Responsibility
//! - Provide registration, status advance, address change and delete flows.
//! - Delegate persistence and status guards to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository guard contracts.
//! - Status advances one step at a time: `registered -> sent -> delivered`.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelRepository, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for parcel use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Persistence-layer failure, including not-found and guard violations.
    Repo(RepoError),
    /// Parcel status has no successor.
    FinalStatus {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// New address is empty after trimming.
    EmptyAddress,
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_not_found())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::FinalStatus { number, status } => {
                write!(f, "parcel {number} status `{status}` has no next status")
            }
            Self::EmptyAddress => f.write_str("address cannot be empty"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for parcel tracking.
pub struct ParcelService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> ServiceResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.repo.add(&parcel)?;
        info!(
            "event=parcel_register module=service status=ok number={} client={}",
            parcel.number, client
        );
        Ok(parcel)
    }

    pub fn get(&self, number: ParcelNumber) -> ServiceResult<Parcel> {
        Ok(self.repo.get(number)?)
    }

    /// Lists every parcel owned by `client`.
    pub fn client_parcels(&self, client: ClientId) -> ServiceResult<Vec<Parcel>> {
        Ok(self.repo.get_by_client(client)?)
    }

    /// Overwrites status without lifecycle checks.
    pub fn set_status(&self, number: ParcelNumber, status: &ParcelStatus) -> ServiceResult<()> {
        Ok(self.repo.set_status(number, status)?)
    }

    /// Moves the parcel one lifecycle step forward and returns the new status.
    ///
    /// # Errors
    /// - `FinalStatus` when the current status is `delivered` or unknown.
    /// - Repository `NotFound` when the parcel does not exist.
    pub fn next_status(&self, number: ParcelNumber) -> ServiceResult<ParcelStatus> {
        let current = self.repo.get_status(number)?;
        let Some(next) = current.next() else {
            return Err(ServiceError::FinalStatus {
                number,
                status: current,
            });
        };

        self.repo.set_status(number, &next)?;
        info!(
            "event=parcel_next_status module=service status=ok number={number} from={current} to={next}"
        );
        Ok(next)
    }

    /// Changes the delivery address of a `registered` parcel.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> ServiceResult<()> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ServiceError::EmptyAddress);
        }
        Ok(self.repo.set_address(number, address)?)
    }

    /// Deletes a `registered` parcel.
    pub fn delete(&self, number: ParcelNumber) -> ServiceResult<()> {
        self.repo.delete(number)?;
        info!("event=parcel_delete module=service status=ok number={number}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ParcelService, ServiceError};
    use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
    use crate::repo::parcel_repo::{GuardedAction, ParcelRepository, RepoError, RepoResult};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryRepo {
        rows: RefCell<Vec<Parcel>>,
    }

    impl MemoryRepo {
        fn find(&self, number: ParcelNumber) -> RepoResult<Parcel> {
            self.rows
                .borrow()
                .iter()
                .find(|parcel| parcel.number == number)
                .cloned()
                .ok_or(RepoError::NotFound(number))
        }

        fn guard(&self, number: ParcelNumber, action: GuardedAction) -> RepoResult<()> {
            let status = self.find(number)?.status;
            if status.allows_edit() {
                Ok(())
            } else {
                Err(RepoError::StatusGuard {
                    number,
                    action,
                    status,
                })
            }
        }
    }

    impl ParcelRepository for MemoryRepo {
        fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
            let mut rows = self.rows.borrow_mut();
            let mut stored = parcel.clone();
            stored.number = rows.len() as ParcelNumber + 1;
            rows.push(stored);
            Ok(rows.len() as ParcelNumber)
        }

        fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
            self.find(number)
        }

        fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .filter(|parcel| parcel.client == client)
                .cloned()
                .collect())
        }

        fn set_status(&self, number: ParcelNumber, status: &ParcelStatus) -> RepoResult<()> {
            for parcel in self.rows.borrow_mut().iter_mut() {
                if parcel.number == number {
                    parcel.status = status.clone();
                }
            }
            Ok(())
        }

        fn get_status(&self, number: ParcelNumber) -> RepoResult<ParcelStatus> {
            Ok(self.find(number)?.status)
        }

        fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
            self.guard(number, GuardedAction::SetAddress)?;
            for parcel in self.rows.borrow_mut().iter_mut() {
                if parcel.number == number {
                    parcel.address = address.to_string();
                }
            }
            Ok(())
        }

        fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
            self.guard(number, GuardedAction::Delete)?;
            self.rows.borrow_mut().retain(|parcel| parcel.number != number);
            Ok(())
        }
    }

    #[test]
    fn register_assigns_number_and_registered_status() {
        let service = ParcelService::new(MemoryRepo::default());

        let parcel = service.register(7, "Main st. 1").unwrap();
        assert!(parcel.is_stored());
        assert_eq!(parcel.status, ParcelStatus::Registered);
        assert_eq!(service.get(parcel.number).unwrap(), parcel);
    }

    #[test]
    fn next_status_walks_lifecycle_then_stops() {
        let service = ParcelService::new(MemoryRepo::default());
        let number = service.register(7, "Main st. 1").unwrap().number;

        assert_eq!(service.next_status(number).unwrap(), ParcelStatus::Sent);
        assert_eq!(service.next_status(number).unwrap(), ParcelStatus::Delivered);

        let err = service.next_status(number).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::FinalStatus {
                status: ParcelStatus::Delivered,
                ..
            }
        ));
    }

    #[test]
    fn change_address_rejects_blank_input_before_repository() {
        let service = ParcelService::new(MemoryRepo::default());

        let err = service.change_address(404, "   ").unwrap_err();
        assert!(matches!(err, ServiceError::EmptyAddress));
    }

    #[test]
    fn change_address_trims_and_updates() {
        let service = ParcelService::new(MemoryRepo::default());
        let number = service.register(7, "old").unwrap().number;

        service.change_address(number, "  new address ").unwrap();
        assert_eq!(service.get(number).unwrap().address, "new address");
    }

    #[test]
    fn delete_after_send_is_rejected() {
        let service = ParcelService::new(MemoryRepo::default());
        let number = service.register(7, "Main st. 1").unwrap().number;
        service.next_status(number).unwrap();

        let err = service.delete(number).unwrap_err();
        assert!(matches!(err, ServiceError::Repo(ref inner) if inner.is_status_guard()));
        assert_eq!(service.client_parcels(7).unwrap().len(), 1);
    }

    #[test]
    fn not_found_is_recognizable_through_service() {
        let service = ParcelService::new(MemoryRepo::default());

        assert!(service.get(99).unwrap_err().is_not_found());
        assert!(service.next_status(99).unwrap_err().is_not_found());
    }
}
