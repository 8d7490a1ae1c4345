pub mod recognition; // Photo → OCR → attributes → catalog match
