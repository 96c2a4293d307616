mod tests_message;
