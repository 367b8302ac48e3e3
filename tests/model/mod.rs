mod tests_identification;
mod tests_resolve;
mod tests_validation;
