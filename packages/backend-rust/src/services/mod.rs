pub mod referral;
pub mod review;
