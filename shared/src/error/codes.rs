//! Unified error codes for the Mercado marketplace backend
//!
//! This module defines all error codes used across the server and frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Vendor errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Shipping errors
//! - 7xxx: Related entity lookups
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Idempotency key already claimed by an in-flight request
    IdempotencyConflict = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Vendor ====================
    /// Vendor profile not found
    VendorNotFound = 3001,
    /// Caller has no vendor profile
    VendorProfileRequired = 3002,
    /// Vendor has no connected gateway account
    VendorAccountMissing = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no line items
    OrderEmpty = 4002,
    /// Order total does not match line item totals
    OrderTotalMismatch = 4003,
    /// Order has already been shipped
    OrderAlreadyShipped = 4004,
    /// Order has already been canceled
    OrderAlreadyCanceled = 4005,
    /// Order has already been refunded
    OrderAlreadyRefunded = 4006,
    /// Order status changed concurrently (conditional update lost)
    OrderStatusConflict = 4007,
    /// Order item not found
    OrderItemNotFound = 4008,

    // ==================== 5xxx: Payment ====================
    /// Payment gateway call failed
    PaymentFailed = 5001,
    /// No payment record for order
    PaymentNotFound = 5002,
    /// Payment has already been refunded
    PaymentAlreadyRefunded = 5003,
    /// Refund call failed
    RefundFailed = 5004,
    /// Payment intent created but not recorded (orphaned authorization)
    PaymentIntentOrphaned = 5005,
    /// Gateway customer/account setup failed
    PaymentSetupFailed = 5006,

    // ==================== 6xxx: Shipping ====================
    /// Carrier API call failed
    CarrierError = 6001,
    /// Shipment generation failed
    ShipmentFailed = 6002,
    /// Pickup date rejected by carrier
    PickupDateTooFar = 6003,
    /// Pickup scheduling failed
    PickupFailed = 6004,
    /// Rate quote unavailable
    RateUnavailable = 6005,
    /// Postal code lookup returned no results
    ZipcodeNotFound = 6006,

    // ==================== 7xxx: Related entities ====================
    /// Product not found
    ProductNotFound = 7001,
    /// Address not found
    AddressNotFound = 7002,
    /// User not found
    UserNotFound = 7003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::IdempotencyConflict => "Request with this idempotency key is in flight",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Vendor
            ErrorCode::VendorNotFound => "Vendor profile not found",
            ErrorCode::VendorProfileRequired => "Caller has no vendor profile",
            ErrorCode::VendorAccountMissing => "Vendor has no connected payment account",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no line items",
            ErrorCode::OrderTotalMismatch => "Order total does not match line item totals",
            ErrorCode::OrderAlreadyShipped => "Order has already been shipped",
            ErrorCode::OrderAlreadyCanceled => "Order has already been canceled",
            ErrorCode::OrderAlreadyRefunded => "Order has already been refunded",
            ErrorCode::OrderStatusConflict => "Order was modified concurrently",
            ErrorCode::OrderItemNotFound => "Order item not found",

            // Payment
            ErrorCode::PaymentFailed => "Payment gateway call failed",
            ErrorCode::PaymentNotFound => "No payment record for this order",
            ErrorCode::PaymentAlreadyRefunded => "Payment has already been refunded",
            ErrorCode::RefundFailed => "Refund could not be processed",
            ErrorCode::PaymentIntentOrphaned => {
                "Payment intent was created but could not be recorded"
            }
            ErrorCode::PaymentSetupFailed => "Payment setup failed",

            // Shipping
            ErrorCode::CarrierError => "Shipping carrier call failed",
            ErrorCode::ShipmentFailed => "Failed to create shipping",
            ErrorCode::PickupDateTooFar => "Pickup date issues. Try diffrent dates.",
            ErrorCode::PickupFailed => "Failed to schedule pickup",
            ErrorCode::RateUnavailable => "Shipping rate is unavailable",
            ErrorCode::ZipcodeNotFound => "Postal code lookup returned no results",

            // Related entities
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::AddressNotFound => "Address not found",
            ErrorCode::UserNotFound => "User not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::IdempotencyConflict),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Vendor
            3001 => Ok(ErrorCode::VendorNotFound),
            3002 => Ok(ErrorCode::VendorProfileRequired),
            3003 => Ok(ErrorCode::VendorAccountMissing),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderTotalMismatch),
            4004 => Ok(ErrorCode::OrderAlreadyShipped),
            4005 => Ok(ErrorCode::OrderAlreadyCanceled),
            4006 => Ok(ErrorCode::OrderAlreadyRefunded),
            4007 => Ok(ErrorCode::OrderStatusConflict),
            4008 => Ok(ErrorCode::OrderItemNotFound),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentNotFound),
            5003 => Ok(ErrorCode::PaymentAlreadyRefunded),
            5004 => Ok(ErrorCode::RefundFailed),
            5005 => Ok(ErrorCode::PaymentIntentOrphaned),
            5006 => Ok(ErrorCode::PaymentSetupFailed),

            // Shipping
            6001 => Ok(ErrorCode::CarrierError),
            6002 => Ok(ErrorCode::ShipmentFailed),
            6003 => Ok(ErrorCode::PickupDateTooFar),
            6004 => Ok(ErrorCode::PickupFailed),
            6005 => Ok(ErrorCode::RateUnavailable),
            6006 => Ok(ErrorCode::ZipcodeNotFound),

            // Related entities
            7001 => Ok(ErrorCode::ProductNotFound),
            7002 => Ok(ErrorCode::AddressNotFound),
            7003 => Ok(ErrorCode::UserNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
