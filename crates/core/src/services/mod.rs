pub mod valuation_service;
